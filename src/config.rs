use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::api_connection::edamam::DEFAULT_TIMEOUT;
use crate::api_connection::EdamamCredentials;

pub const DEFAULT_RECIPES_PATH: &str = "data/sample_recipes.json";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub recipes_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub edamam_app_id: Option<String>,
    pub edamam_app_key: Option<String>,
    pub edamam_url: Option<String>,
    pub nutrition_timeout: Duration,
    pub production: bool,
    pub cors_origin: Option<String>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recipes_path: PathBuf::from(DEFAULT_RECIPES_PATH),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            openai_api_key: None,
            openai_model: None,
            openai_base_url: None,
            edamam_app_id: None,
            edamam_app_key: None,
            edamam_url: None,
            nutrition_timeout: DEFAULT_TIMEOUT,
            production: false,
            cors_origin: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            recipes_path: get("RECIPES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.recipes_path),
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|port| port.trim().parse().ok())
                .unwrap_or(defaults.port),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL"),
            openai_base_url: get("OPENAI_BASE_URL"),
            edamam_app_id: get("EDAMAM_APP_ID"),
            edamam_app_key: get("EDAMAM_APP_KEY"),
            edamam_url: get("EDAMAM_URL"),
            nutrition_timeout: get("NUTRITION_TIMEOUT_SECS")
                .and_then(|secs| secs.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.nutrition_timeout),
            production: get("APP_ENV")
                .map(|value| value.trim().eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            cors_origin: get("CORS_ORIGIN"),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: get("LOG_FORMAT")
                .map(|value| LogFormat::parse(&value))
                .unwrap_or_default(),
        }
    }

    pub fn edamam_credentials(&self) -> Option<EdamamCredentials> {
        EdamamCredentials::from_parts(self.edamam_app_id.clone(), self.edamam_app_key.clone())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.recipes_path, PathBuf::from(DEFAULT_RECIPES_PATH));
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert!(config.openai_api_key.is_none());
        assert!(config.edamam_credentials().is_none());
        assert!(!config.production);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.nutrition_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_values_from_environment() {
        let config = config_from(&[
            ("RECIPES_PATH", "/tmp/recipes.json"),
            ("PORT", "8080"),
            ("OPENAI_API_KEY", "sk-test"),
            ("EDAMAM_APP_ID", "id"),
            ("EDAMAM_APP_KEY", "key"),
            ("APP_ENV", "Production"),
            ("CORS_ORIGIN", "https://pantry.example"),
            ("LOG_FORMAT", "json"),
            ("NUTRITION_TIMEOUT_SECS", "3"),
        ]);
        assert_eq!(config.recipes_path, PathBuf::from("/tmp/recipes.json"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert!(config.edamam_credentials().is_some());
        assert!(config.production);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.nutrition_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_blank_and_invalid_values_are_ignored() {
        let config = config_from(&[("OPENAI_API_KEY", "  "), ("PORT", "not-a-port")]);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
