use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{NutritionDetailsRequest, NutritionDetailsResponse, DEFAULT_EDAMAM_URL};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NutritionApiError {
    #[error("Nutrition API credentials not configured")]
    MissingCredentials,
    #[error("Nutrition API request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Nutrition API error: {0}")]
    Status(reqwest::StatusCode),
    #[error("Failed to parse nutrition API response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct EdamamCredentials {
    pub app_id: String,
    pub app_key: String,
}

impl EdamamCredentials {
    /// Both values must be present and non-blank.
    pub fn from_parts(app_id: Option<String>, app_key: Option<String>) -> Option<Self> {
        match (app_id, app_key) {
            (Some(app_id), Some(app_key))
                if !app_id.trim().is_empty() && !app_key.trim().is_empty() =>
            {
                Some(Self { app_id, app_key })
            }
            _ => None,
        }
    }
}

/// Client for the nutrition-details endpoint: one POST per analysis, no retries.
#[derive(Debug, Clone)]
pub struct EdamamClient {
    client: Client,
    url: String,
    credentials: Option<EdamamCredentials>,
}

impl EdamamClient {
    pub fn new(
        credentials: Option<EdamamCredentials>,
        url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NutritionApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.unwrap_or_else(|| DEFAULT_EDAMAM_URL.to_string()),
            credentials,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    pub async fn nutrition_details(
        &self,
        request: &NutritionDetailsRequest,
    ) -> Result<NutritionDetailsResponse, NutritionApiError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(NutritionApiError::MissingCredentials)?;

        debug!(lines = request.ingr.len(), "Requesting nutrition details");
        let response = self
            .client
            .post(&self.url)
            .query(&[
                ("app_id", credentials.app_id.as_str()),
                ("app_key", credentials.app_key.as_str()),
            ])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(NutritionApiError::Status(status));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_both_parts() {
        assert!(EdamamCredentials::from_parts(Some("id".into()), Some("key".into())).is_some());
        assert!(EdamamCredentials::from_parts(Some("id".into()), None).is_none());
        assert!(EdamamCredentials::from_parts(Some(" ".into()), Some("key".into())).is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses_to_call() {
        let client = EdamamClient::new(None, None, DEFAULT_TIMEOUT).unwrap();
        assert!(!client.is_configured());
        let request = NutritionDetailsRequest {
            title: "Test".to_string(),
            ingr: vec!["1 portion rice".to_string()],
        };
        assert!(matches!(
            client.nutrition_details(&request).await,
            Err(NutritionApiError::MissingCredentials)
        ));
    }
}
