mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use tracing::debug;

/// Environment variable holding the generative-text API credential.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    load_from(&config_path, env::var(API_KEY_ENV).ok()).await
}

/// Reads `config_path`, applies the API key override, and validates the result.
pub async fn load_from(config_path: &str, api_key: Option<String>) -> Result<Config> {
    debug!("Loading configuration from: {}", config_path);

    let config_str = tokio::fs::read_to_string(config_path).await?;
    let config = Config::from_yaml(&config_str)?.with_api_key_override(api_key);
    config.validate()?;

    Ok(config)
}

impl Config {
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Replaces the configured API key when the override is present and non-blank.
    pub fn with_api_key_override(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = key;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(Error::config(format!(
                "no API key configured for the plant information service; set {} or llm.api_key",
                API_KEY_ENV
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(Error::config("llm.model must not be empty"));
        }
        if self.model.path.trim().is_empty() {
            return Err(Error::config("model.path must not be empty"));
        }
        if self.model.default_input_size == 0 {
            return Err(Error::config("model.default_input_size must be positive"));
        }
        Ok(())
    }
}
