//! Layered configuration loading.

use crate::config::merge::merge_policy;
use crate::config::paths::{global_config_path, resolve_in_workspace};
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::AletheiaConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Sources, lowest to highest precedence: built-in defaults, the global
    /// config file, `config/config.toml`, `config/{ALETHEIA_ENV}.toml`, then
    /// `ALETHEIA__SECTION__KEY` environment variables.
    pub fn load(workspace_root: &Path) -> Result<AletheiaConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: AletheiaConfig = builder.build()?.try_deserialize()?;
        Ok(config.relative_to(workspace_root))
    }

    /// Load defaults plus one explicit file (environment overrides still apply).
    pub fn load_from_file(path: &Path) -> Result<AletheiaConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = environment::add_to_builder(builder);

        let config: AletheiaConfig = builder.build()?.try_deserialize()?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.relative_to(base))
    }

    pub fn xdg_config_path() -> Option<PathBuf> {
        global_config_path()
    }
}

impl AletheiaConfig {
    fn relative_to(mut self, base: &Path) -> Self {
        self.storage.store_path = resolve_in_workspace(base, &self.storage.store_path);
        self
    }
}
