//! Integration tests for layered configuration loading

use aletheia::cli::{Commands, RunContext};
use aletheia::config::{ConfigLoader, ProviderType, DEFAULT_STORE_PATH};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

// Serializes tests that touch process environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    "XDG_CONFIG_HOME",
    "ALETHEIA_ENV",
    "ALETHEIA__PROVIDER__MODEL",
    "ALETHEIA__GENERATION__MAX_ATTEMPTS",
];

/// Run `f` with the given variables set and every other config variable cleared.
fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<_> = VARS.iter().map(|name| (*name, std::env::var(name).ok())).collect();
    for name in VARS {
        std::env::remove_var(name);
    }
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }
    result
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_defaults_without_any_file() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let config = with_env(&[("XDG_CONFIG_HOME", xdg.path().to_str().unwrap())], || {
        ConfigLoader::load(workspace.path()).unwrap()
    });

    assert_eq!(config.provider.provider_type, ProviderType::Gemini);
    assert_eq!(config.provider.model, "gemini-2.5-flash");
    assert_eq!(config.storage.store_path, workspace.path().join(DEFAULT_STORE_PATH));
}

#[test]
fn test_precedence_global_workspace_env_file_and_variables() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write(
        &xdg.path().join("aletheia").join("config.toml"),
        "[provider]\nprovider_type = \"openai\"\nmodel = \"global-model\"\n\n[generation]\ninitial_delay_ms = 50\n",
    );
    write(
        &workspace.path().join("config").join("config.toml"),
        "[provider]\nmodel = \"workspace-model\"\n\n[storage]\ndocument_key = \"ws\"\n",
    );
    write(
        &workspace.path().join("config").join("staging.toml"),
        "[storage]\ndocument_key = \"staging\"\n",
    );

    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", xdg.path().to_str().unwrap()),
            ("ALETHEIA_ENV", "staging"),
            ("ALETHEIA__GENERATION__MAX_ATTEMPTS", "7"),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );

    assert_eq!(config.provider.provider_type, ProviderType::OpenAI);
    assert_eq!(config.provider.model, "workspace-model");
    assert_eq!(config.generation.initial_delay_ms, 50);
    assert_eq!(config.generation.max_attempts, 7);
    assert_eq!(config.storage.document_key, "staging");
}

#[test]
fn test_environment_variable_beats_workspace_file() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write(
        &workspace.path().join("config").join("config.toml"),
        "[provider]\nmodel = \"workspace-model\"\n",
    );

    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", xdg.path().to_str().unwrap()),
            ("ALETHEIA__PROVIDER__MODEL", "env-model"),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );

    assert_eq!(config.provider.model, "env-model");
}

#[test]
fn test_invalid_configuration_is_rejected_by_run_context() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write(
        &workspace.path().join("config").join("config.toml"),
        "[provider]\nprovider_type = \"local\"\nmodel = \"m\"\n\n[generation]\nmax_attempts = 0\n",
    );

    let result = with_env(&[("XDG_CONFIG_HOME", xdg.path().to_str().unwrap())], || {
        RunContext::new(workspace.path().to_path_buf(), None).map(|_| ())
    });

    let message = result.unwrap_err().to_string();
    assert!(message.contains("Local providers require an endpoint"));
    assert!(message.contains("max_attempts"));
}

#[test]
fn test_status_through_run_context_needs_no_api_key() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let output = with_env(&[("XDG_CONFIG_HOME", xdg.path().to_str().unwrap())], || {
        let context = RunContext::new(workspace.path().to_path_buf(), None).unwrap();
        context
            .execute(&Commands::Status {
                format: "json".to_string(),
            })
            .unwrap()
    });

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["scaffolded"], false);
    assert!(workspace.path().join(DEFAULT_STORE_PATH).exists());
}
