//! Config and data path resolution.

use std::path::{Path, PathBuf};

/// `$XDG_CONFIG_HOME/aletheia/config.toml`, else the platform config directory.
pub fn global_config_path() -> Option<PathBuf> {
    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))?;
    Some(config_home.join("aletheia").join("config.toml"))
}

/// Relative paths in the configuration are relative to the workspace root.
pub fn resolve_in_workspace(workspace_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}
