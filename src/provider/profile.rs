//! Provider profile: the configured backend and how it becomes a live client.

use crate::error::ApiError;
use crate::provider::{CompletionOptions, ModelProvider, ModelProviderClient, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "local")]
    LocalCustom,
}

pub fn provider_type_slug(provider_type: ProviderType) -> &'static str {
    match provider_type {
        ProviderType::Gemini => "gemini",
        ProviderType::OpenAI => "openai",
        ProviderType::Ollama => "ollama",
        ProviderType::LocalCustom => "local",
    }
}

impl ProviderType {
    /// Environment variables consulted, in order, when no key is configured.
    pub fn api_key_env_vars(self) -> &'static [&'static str] {
        match self {
            ProviderType::Gemini => &["GEMINI_API_KEY", "API_KEY"],
            ProviderType::OpenAI => &["OPENAI_API_KEY"],
            ProviderType::Ollama | ProviderType::LocalCustom => &[],
        }
    }

    fn requires_api_key(self) -> bool {
        matches!(self, ProviderType::Gemini | ProviderType::OpenAI)
    }
}

/// Provider section of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_name: Option<String>,

    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Explicit API key; falls back to the provider's environment variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub default_options: CompletionOptions,
}

fn default_provider_type() -> ProviderType {
    ProviderType::Gemini
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_name: None,
            provider_type: default_provider_type(),
            model: default_model(),
            api_key: None,
            endpoint: None,
            default_options: CompletionOptions::default(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }

        if self.provider_type == ProviderType::LocalCustom && self.endpoint.is_none() {
            return Err("Local providers require an endpoint".to_string());
        }

        if let Some(temperature) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }

        Ok(())
    }

    /// Configured key, else the first non-empty provider environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        self.provider_type
            .api_key_env_vars()
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.provider_name
            .as_deref()
            .unwrap_or_else(|| provider_type_slug(self.provider_type))
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, ApiError> {
        let api_key = self.resolve_api_key();
        if self.provider_type.requires_api_key() && api_key.is_none() {
            return Err(ApiError::ProviderNotConfigured(format!(
                "No API key for provider '{}'. Set provider.api_key or one of: {}",
                self.display_name(),
                self.provider_type.api_key_env_vars().join(", ")
            )));
        }

        let model = self.model.clone();
        let provider = match self.provider_type {
            ProviderType::Gemini => ModelProvider::Gemini {
                model,
                api_key: api_key.unwrap_or_default(),
                base_url: self.endpoint.clone(),
            },
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model,
                api_key: api_key.unwrap_or_default(),
                base_url: self.endpoint.clone(),
            },
            ProviderType::Ollama => ModelProvider::Ollama {
                model,
                base_url: self.endpoint.clone(),
            },
            ProviderType::LocalCustom => ModelProvider::LocalCustom {
                model,
                endpoint: self.endpoint.clone().ok_or_else(|| {
                    ApiError::ProviderNotConfigured(
                        "Local providers require an endpoint".to_string(),
                    )
                })?,
                api_key,
            },
        };
        Ok(provider)
    }

    /// Build the shared client the orchestrator drives.
    pub fn create_client(&self) -> Result<Arc<dyn ModelProviderClient>, ApiError> {
        self.validate().map_err(ApiError::ConfigError)?;
        let provider = self.to_model_provider()?;
        Ok(Arc::from(ProviderFactory::create_client(&provider)?))
    }
}
