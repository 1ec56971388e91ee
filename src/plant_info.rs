//! Care-guide enrichment for an identified species.
//!
//! Lookups never fail from the caller's point of view: every problem with the
//! external text service is folded into [`PlantInfo::Error`].

use crate::{
    Error, Result,
    config::LlmConfig,
    llm::{ChatCompletionRequest, ChatMessage, LlmClient},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlantInfo {
    Success { info: String },
    Error { message: String },
}

impl PlantInfo {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

pub fn build_prompt(plant_name: &str) -> String {
    format!(
        "Give a short description and a short care guide for the plant: {plant_name}.\n\
         Include:\n\
         - Short description\n\
         - Light, water, and soil requirements\n\
         - Common issues and tips\n"
    )
}

pub struct PlantInfoService {
    client: Arc<dyn LlmClient>,
    system_prompt: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl PlantInfoService {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_config(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            system_prompt: config.system_prompt.clone(),
            temperature: Some(config.temperature),
            max_tokens: config.max_tokens,
        }
    }

    /// Fetches a description and care guide for `plant_name`.
    pub async fn lookup(&self, plant_name: &str) -> PlantInfo {
        match self.fetch(plant_name).await {
            Ok(info) => {
                info!("Retrieved plant information for: {}", plant_name);
                PlantInfo::Success { info }
            }
            Err(e) => {
                error!("Error getting plant info for '{}': {}", plant_name, e);
                PlantInfo::Error {
                    message: format!("Failed to get plant information: {}", e),
                }
            }
        }
    }

    async fn fetch(&self, plant_name: &str) -> Result<String> {
        let plant_name = plant_name.trim();
        if plant_name.is_empty() {
            return Err(Error::llm("plant name must not be empty"));
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = &self.system_prompt {
            messages.push(ChatMessage::system(system_prompt.clone()));
        }
        messages.push(ChatMessage::user(build_prompt(plant_name)));

        let response = self
            .client
            .create_chat_completion(ChatCompletionRequest {
                messages,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            })
            .await?;

        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| Error::llm("the model returned an empty answer"))
    }
}
