//! Error types for the Aletheia codex engine.

use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Raw failure reported by a provider client, before classification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

/// Failure class of a single remote generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Malformed,
    Transport,
}

/// Errors surfaced by the resilient invocation wrapper and the request builders.
///
/// Every variant carries the context label of the unit the call was made for.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationError {
    #[error(
        "API rate limit exceeded for {context} after {attempts} attempts. Wait a few minutes before retrying."
    )]
    RateLimited { context: String, attempts: u32 },

    #[error("Response for {context} was incoherent: {detail}")]
    Malformed { context: String, detail: String },

    #[error("Connection to the generation service failed during {context}: {detail}")]
    Transport { context: String, detail: String },
}

impl InvocationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            InvocationError::RateLimited { .. } => FailureKind::RateLimited,
            InvocationError::Malformed { .. } => FailureKind::Malformed,
            InvocationError::Transport { .. } => FailureKind::Transport,
        }
    }

    pub fn context(&self) -> &str {
        match self {
            InvocationError::RateLimited { context, .. }
            | InvocationError::Malformed { context, .. }
            | InvocationError::Transport { context, .. } => context,
        }
    }
}

/// Crate-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Generation failed for \"{unit}\": {source}")]
    GenerationFailed {
        unit: String,
        #[source]
        source: InvocationError,
    },

    #[error("A {running} workflow is already running")]
    WorkflowBusy { running: String },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// Failure class of the remote call behind a generation error, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ApiError::GenerationFailed { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
