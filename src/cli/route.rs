//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::book::{resolve_path, Book, NodePath};
use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{
    format_event, format_scaffold_report, format_selection_json, format_selection_text,
    format_status_json, format_status_text, format_synthesis_report, CodexStatus,
};
use crate::config::{AletheiaConfig, ConfigLoader};
use crate::error::{ApiError, StorageError};
use crate::export::{render_html, DEFAULT_EXPORT_FILE};
use crate::invocation::ResilientInvoker;
use crate::orchestrator::{Orchestrator, OrchestratorEvent};
use crate::store::{BookRepository, SledDocumentStore};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, effective configuration and the codex store.
pub struct RunContext {
    workspace_root: PathBuf,
    config: AletheiaConfig,
    repository: BookRepository,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;

        let store_path = &config.storage.store_path;
        std::fs::create_dir_all(store_path)
            .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;
        let store = Arc::new(SledDocumentStore::new(store_path)?);
        let repository = BookRepository::new(store, config.storage.document_key.clone());
        debug!(store_path = %store_path.display(), "Document store opened");

        Ok(Self {
            workspace_root,
            config,
            repository,
        })
    }

    pub fn config(&self) -> &AletheiaConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Scaffold { section, yes } => self.handle_scaffold(*section, *yes),
            Commands::Synthesize { chapter } => self.handle_synthesize(chapter.as_deref()),
            Commands::Status { format } => {
                let status = CodexStatus::from_book(&self.repository.load());
                match format.as_str() {
                    "json" => format_status_json(&status),
                    _ => Ok(format_status_text(&status)),
                }
            }
            Commands::Show { path, format } => {
                let book = self.repository.load();
                let selection = resolve_path(&book, path).ok_or_else(|| {
                    ApiError::InvalidSelection(format!("nothing at path '{}'", path))
                })?;
                match format.as_str() {
                    "json" => format_selection_json(&selection),
                    _ => Ok(format_selection_text(&selection)),
                }
            }
            Commands::Edit {
                path,
                content,
                file,
            } => self.handle_edit(path, content.as_deref(), file.as_ref()),
            Commands::Export { output } => {
                let target = output
                    .clone()
                    .unwrap_or_else(|| self.workspace_root.join(DEFAULT_EXPORT_FILE));
                let html = render_html(&self.repository.load());
                std::fs::write(&target, html)
                    .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;
                Ok(format!("Exported codex to {}", target.display()))
            }
            Commands::Reset { yes } => {
                if !*yes && !confirm("Discard every fragment and reset the codex?")? {
                    return Ok("Reset cancelled".to_string());
                }
                self.offline_orchestrator().reset()?;
                Ok("Codex reset to the built-in template".to_string())
            }
            Commands::Config { command } => match command {
                ConfigCommands::Show => self.handle_config_show(),
            },
        }
    }

    fn handle_scaffold(&self, section: Option<usize>, yes: bool) -> Result<String, ApiError> {
        match section {
            None => {
                let report = self.run_workflow(|o| async move { o.ensure_scaffolded().await })?;
                Ok(format_scaffold_report(&report))
            }
            Some(index) => {
                let prompt = regeneration_prompt(&self.repository.load(), index)?;
                if !yes && !confirm(&prompt)? {
                    return Ok("Regeneration cancelled".to_string());
                }
                let report =
                    self.run_workflow(move |o| async move { o.regenerate_section(index).await })?;
                Ok(format_scaffold_report(&report))
            }
        }
    }

    fn handle_synthesize(&self, chapter: Option<&str>) -> Result<String, ApiError> {
        let target = match chapter {
            Some(raw) => match NodePath::parse(raw) {
                Some(path) if !path.is_page() => Some(path),
                _ => {
                    return Err(ApiError::InvalidSelection(format!(
                        "'{}' is not a chapter path (expected section-chapter)",
                        raw
                    )))
                }
            },
            None => None,
        };

        let report = self.run_workflow(move |o| async move {
            o.ensure_scaffolded().await?;
            match target {
                Some(path) => o.synthesize_chapter(path.section, path.chapter).await,
                None => o.synthesize_book().await,
            }
        })?;
        Ok(format_synthesis_report(&report))
    }

    fn handle_edit(
        &self,
        path: &str,
        content: Option<&str>,
        file: Option<&PathBuf>,
    ) -> Result<String, ApiError> {
        let node = NodePath::parse(path)
            .filter(NodePath::is_page)
            .ok_or_else(|| {
                ApiError::InvalidSelection(format!(
                    "'{}' is not a fragment path (expected section-chapter-page)",
                    path
                ))
            })?;
        let content = match (content, file) {
            (Some(text), _) => text.to_string(),
            (None, Some(file)) => std::fs::read_to_string(file)
                .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?,
            (None, None) => {
                return Err(ApiError::InvalidSelection(
                    "provide --content or --file".to_string(),
                ))
            }
        };

        self.offline_orchestrator().edit_page(node, content)?;
        Ok(format!("Updated fragment {}", node))
    }

    fn handle_config_show(&self) -> Result<String, ApiError> {
        let mut shown = self.config.clone();
        if shown.provider.api_key.is_some() {
            shown.provider.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render configuration: {}", e)))
    }

    /// Orchestrator for intents that never call the model.
    fn offline_orchestrator(&self) -> Orchestrator {
        Orchestrator::offline(self.repository.clone(), self.config.generation_settings())
    }

    fn build_orchestrator(&self) -> Result<Orchestrator, ApiError> {
        let client = self.config.provider.create_client()?;
        info!(
            provider = client.provider_name(),
            model = client.model_name(),
            "Provider client ready"
        );
        let invoker = ResilientInvoker::new(client, self.config.generation.retry_policy());
        Ok(Orchestrator::new(
            invoker,
            self.repository.clone(),
            self.config.generation_settings(),
        ))
    }

    /// Run one workflow on a fresh runtime, streaming its events to stderr.
    fn run_workflow<T, F, Fut>(&self, workflow: F) -> Result<T, ApiError>
    where
        F: FnOnce(Arc<Orchestrator>) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::ProviderError(format!("Failed to create runtime: {}", e)))?;
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let orchestrator = Arc::new(self.build_orchestrator()?.with_events(sender));

        runtime.block_on(async move {
            let printer = tokio::spawn(print_events(receiver));
            let result = workflow(orchestrator).await;
            // the workflow future owned the last sender; the printer drains and exits
            let _ = printer.await;
            result
        })
    }
}

async fn print_events(mut receiver: UnboundedReceiver<OrchestratorEvent>) {
    while let Some(event) = receiver.recv().await {
        if let Some(line) = format_event(&event) {
            eprintln!("{}", line);
        }
    }
}

/// Confirmation text naming the section 1-based, as progress output does.
fn regeneration_prompt(book: &Book, index: usize) -> Result<String, ApiError> {
    let section = book
        .section(index)
        .ok_or_else(|| ApiError::InvalidSelection(format!("no section at index {}", index)))?;
    Ok(format!(
        "Regenerate section {}: {}? Fragments and text in its chapters will be replaced.",
        index + 1,
        section.title
    ))
}

fn confirm(prompt: &str) -> Result<bool, ApiError> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))
}
