//! Orchestrator
//!
//! Drives the two generation phases over the shared codex. A workflow walks
//! its units in ascending index order, makes one remote call per unit and
//! commits each result before moving on, so a failure part-way through keeps
//! every unit that already succeeded.
//!
//! Commits are copy-on-write: the current `Arc<Book>` is cloned, the result is
//! merged into the clone and the clone replaces the shared reference. Readers
//! holding a snapshot never observe a partial merge. A commit always starts
//! from the tree current *at commit time*, so a page edited between two units
//! keeps its edit.
//!
//! Persistence is serialized: each commit writes the newest tree under one
//! lock, so the store never ends behind memory.
//!
//! At most one workflow runs at a time; starting another fails with
//! [`ApiError::WorkflowBusy`].

pub mod events;
mod scaffold;
mod synthesis;

pub use events::{OrchestratorEvent, WorkflowKind};
pub use scaffold::ScaffoldReport;
pub use synthesis::SynthesisReport;

use crate::book::{codex_template, Book, NodePath};
use crate::error::{ApiError, InvocationError};
use crate::generation::GenerationSettings;
use crate::invocation::ResilientInvoker;
use crate::store::BookRepository;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "workflow", rename_all = "snake_case")]
pub enum WorkflowStatus {
    Idle,
    Running(WorkflowKind),
}

impl WorkflowStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, WorkflowStatus::Idle)
    }
}

/// Observable orchestrator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestratorState {
    pub status: WorkflowStatus,
    pub progress: Option<String>,
    pub last_error: Option<String>,
    /// RFC 3339 timestamp of the latest commit
    pub last_commit_at: Option<String>,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self {
            status: WorkflowStatus::Idle,
            progress: None,
            last_error: None,
            last_commit_at: None,
        }
    }
}

pub struct Orchestrator {
    book: RwLock<Arc<Book>>,
    state: Mutex<OrchestratorState>,
    /// `None` for an offline orchestrator: edits and reset only
    invoker: Option<ResilientInvoker>,
    repository: BookRepository,
    persist_lock: Mutex<()>,
    settings: GenerationSettings,
    events: Option<UnboundedSender<OrchestratorEvent>>,
}

/// Marks a workflow as running; resets the status to idle on drop.
struct WorkflowGuard<'a> {
    orchestrator: &'a Orchestrator,
    kind: WorkflowKind,
}

impl Drop for WorkflowGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.orchestrator.state.lock();
        if state.status == WorkflowStatus::Running(self.kind) {
            state.status = WorkflowStatus::Idle;
        }
    }
}

impl Orchestrator {
    /// Create an orchestrator over the codex persisted in `repository`.
    pub fn new(
        invoker: ResilientInvoker,
        repository: BookRepository,
        settings: GenerationSettings,
    ) -> Self {
        Self::build(Some(invoker), repository, settings)
    }

    /// Orchestrator without a generation client. Generation workflows fail with
    /// [`ApiError::ProviderNotConfigured`]; edits and reset work as usual.
    pub fn offline(repository: BookRepository, settings: GenerationSettings) -> Self {
        Self::build(None, repository, settings)
    }

    fn build(
        invoker: Option<ResilientInvoker>,
        repository: BookRepository,
        settings: GenerationSettings,
    ) -> Self {
        let book = repository.load();
        Self {
            book: RwLock::new(Arc::new(book)),
            state: Mutex::new(OrchestratorState::default()),
            invoker,
            repository,
            persist_lock: Mutex::new(()),
            settings,
            events: None,
        }
    }

    pub fn with_events(mut self, sender: UnboundedSender<OrchestratorEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Current snapshot of the codex.
    pub fn book(&self) -> Arc<Book> {
        self.book.read().clone()
    }

    pub fn state(&self) -> OrchestratorState {
        self.state.lock().clone()
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Replace one page's content.
    ///
    /// Allowed while a workflow runs; later commits rebase onto the edit.
    pub fn edit_page(&self, path: NodePath, content: impl Into<String>) -> Result<(), ApiError> {
        let content = content.into();
        let committed = self.commit(|book| book.with_page_content(path, content));
        if committed.is_none() {
            return Err(ApiError::InvalidSelection(format!(
                "{} does not address a page",
                path
            )));
        }
        info!(path = %path, "Page edited");
        Ok(())
    }

    /// Discard all generated content and start again from the built-in template.
    pub fn reset(&self) -> Result<(), ApiError> {
        let _guard = self.begin(WorkflowKind::Reset)?;
        self.commit(|_| Some(codex_template()));
        self.complete(WorkflowKind::Reset, "Codex reset to the built-in template");
        Ok(())
    }

    fn invoker(&self) -> Result<&ResilientInvoker, ApiError> {
        self.invoker.as_ref().ok_or_else(|| {
            ApiError::ProviderNotConfigured(
                "this orchestrator was opened without a generation client".to_string(),
            )
        })
    }

    fn begin(&self, kind: WorkflowKind) -> Result<WorkflowGuard<'_>, ApiError> {
        {
            let mut state = self.state.lock();
            if let WorkflowStatus::Running(running) = state.status {
                warn!(requested = %kind, running = %running, "Workflow rejected, another is running");
                return Err(ApiError::WorkflowBusy {
                    running: running.to_string(),
                });
            }
            state.status = WorkflowStatus::Running(kind);
            state.progress = None;
            state.last_error = None;
        }
        info!(workflow = %kind, "Workflow started");
        self.emit(OrchestratorEvent::WorkflowStarted { workflow: kind });
        Ok(WorkflowGuard {
            orchestrator: self,
            kind,
        })
    }

    fn report_progress(&self, kind: WorkflowKind, message: String) {
        info!(workflow = %kind, "{}", message);
        self.state.lock().progress = Some(message.clone());
        self.emit(OrchestratorEvent::Progress {
            workflow: kind,
            message,
        });
    }

    fn complete(&self, kind: WorkflowKind, message: impl Into<String>) {
        let message = message.into();
        info!(workflow = %kind, "{}", message);
        self.state.lock().progress = Some(message.clone());
        self.emit(OrchestratorEvent::WorkflowCompleted {
            workflow: kind,
            message,
        });
    }

    /// Record a unit failure and turn it into the workflow's error.
    fn fail(&self, kind: WorkflowKind, unit: &str, source: InvocationError) -> ApiError {
        let err = ApiError::GenerationFailed {
            unit: unit.to_string(),
            source,
        };
        error!(workflow = %kind, unit, error = %err, "Workflow aborted");
        self.state.lock().last_error = Some(err.to_string());
        self.emit(OrchestratorEvent::WorkflowFailed {
            workflow: kind,
            unit: unit.to_string(),
            error: err.to_string(),
        });
        err
    }

    /// Apply `change` to the current tree and swap the result in, then persist.
    ///
    /// Returns `None`, leaving the tree untouched, when `change` rejects it.
    fn commit<F>(&self, change: F) -> Option<Arc<Book>>
    where
        F: FnOnce(&Book) -> Option<Book>,
    {
        let next = {
            let mut current = self.book.write();
            let next = Arc::new(change(current.as_ref())?);
            *current = next.clone();
            next
        };
        self.state.lock().last_commit_at = Some(chrono::Utc::now().to_rfc3339());
        self.persist();
        Some(next)
    }

    /// Write the newest tree. Persistence is best-effort: in-memory state stays
    /// authoritative.
    ///
    /// The snapshot is taken under `persist_lock`, so a write started by an
    /// older commit can never land after a newer one.
    fn persist(&self) {
        let _persisting = self.persist_lock.lock();
        let latest = self.book();
        if let Err(e) = self.repository.save(&latest) {
            warn!(key = self.repository.key(), error = %e, "Failed to persist codex");
        }
    }

    fn emit(&self, event: OrchestratorEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }
}
