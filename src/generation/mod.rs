//! Generation request builders.
//!
//! Each builder turns a slice of the codex into one structured-output
//! [`GenerationRequest`] and parses the reply into a typed mapping. Building
//! and parsing are pure; `execute` runs the request through the
//! [`ResilientInvoker`](crate::invocation::ResilientInvoker).

pub mod prompt;
pub mod scaffold;
pub mod synthesis;

pub use scaffold::ScaffoldRequest;
pub use synthesis::SynthesisRequest;

use crate::error::InvocationError;
use crate::provider::CompletionOptions;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Model and sampling options applied to every request the builders produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    #[serde(default)]
    pub options: CompletionOptions,
}

impl GenerationSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            options: CompletionOptions::default(),
        }
    }
}

/// Some backends wrap structured output in a markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_suffix("```").unwrap_or(rest);
    // drop the info string ("json") on the opening line
    match body.split_once('\n') {
        Some((info, json)) if !info.trim_start().starts_with('{') => json.trim(),
        _ => body.trim(),
    }
}

/// Decode a reply body, mapping any structural mismatch to `Malformed`.
pub(crate) fn decode_reply<T: DeserializeOwned>(
    text: &str,
    context: &str,
) -> Result<T, InvocationError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| InvocationError::Malformed {
        context: context.to_string(),
        detail: e.to_string(),
    })
}
