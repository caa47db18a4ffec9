use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, Provider, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_OPENAI_MODEL,
};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not configured for {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("No response choices received from API")]
    EmptyResponse,
}

impl Provider {
    /// Blank keys count as missing.
    pub fn openai(
        api_key: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Self {
        Self::OpenAi {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        }
    }

    pub fn has_credentials(&self) -> bool {
        match self {
            Provider::OpenAi { api_key, .. } => api_key.is_some(),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAi { model, .. } => model,
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenAi {
                api_key, base_url, ..
            } => {
                let api_key = api_key
                    .as_deref()
                    .ok_or_else(|| ApiConnectionError::MissingApiKey("OpenAI".to_string()))?;

                let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
                debug!(%url, model = %request.model, "Sending chat completion request");

                let response = Client::new()
                    .post(&url)
                    .bearer_auth(api_key)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let body = response.text().await?;
                    let chat_response: ChatCompletionResponse = serde_json::from_str(&body)?;
                    if chat_response.choices.is_empty() {
                        return Err(ApiConnectionError::EmptyResponse);
                    }
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}
