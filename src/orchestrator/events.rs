//! Orchestrator event stream.
//!
//! Events are delivered best-effort over an unbounded channel; a dropped
//! receiver never affects the workflow that emits them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Scaffold,
    BookSynthesis,
    ChapterSynthesis,
    SectionRegeneration,
    Reset,
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowKind::Scaffold => "scaffold",
            WorkflowKind::BookSynthesis => "book synthesis",
            WorkflowKind::ChapterSynthesis => "chapter synthesis",
            WorkflowKind::SectionRegeneration => "section regeneration",
            WorkflowKind::Reset => "reset",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    WorkflowStarted {
        workflow: WorkflowKind,
    },
    Progress {
        workflow: WorkflowKind,
        message: String,
    },
    /// One unit of work was merged into the shared book
    UnitCommitted {
        workflow: WorkflowKind,
        unit: String,
        path: String,
    },
    WorkflowCompleted {
        workflow: WorkflowKind,
        message: String,
    },
    WorkflowFailed {
        workflow: WorkflowKind,
        unit: String,
        error: String,
    },
}

impl OrchestratorEvent {
    pub fn workflow(&self) -> WorkflowKind {
        match self {
            OrchestratorEvent::WorkflowStarted { workflow }
            | OrchestratorEvent::Progress { workflow, .. }
            | OrchestratorEvent::UnitCommitted { workflow, .. }
            | OrchestratorEvent::WorkflowCompleted { workflow, .. }
            | OrchestratorEvent::WorkflowFailed { workflow, .. } => *workflow,
        }
    }
}
