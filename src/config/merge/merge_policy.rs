//! Merge rules: defaults first, every later source overrides earlier ones key by key.

use crate::invocation::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::provider::profile::DEFAULT_MODEL;
use crate::store::DEFAULT_DOCUMENT_KEY;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub const DEFAULT_STORE_PATH: &str = ".aletheia/store";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("provider.provider_type", "gemini")?
        .set_default("provider.model", DEFAULT_MODEL)?
        .set_default("generation.max_attempts", i64::from(DEFAULT_MAX_ATTEMPTS))?
        .set_default(
            "generation.initial_delay_ms",
            DEFAULT_INITIAL_DELAY.as_millis() as i64,
        )?
        .set_default("storage.store_path", DEFAULT_STORE_PATH)?
        .set_default("storage.document_key", DEFAULT_DOCUMENT_KEY)
}
