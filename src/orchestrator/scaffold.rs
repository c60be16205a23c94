//! Scaffold phase: fragment titles for every chapter, one section at a time.

use super::{Orchestrator, OrchestratorEvent, WorkflowKind};
use crate::error::ApiError;
use crate::generation::ScaffoldRequest;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScaffoldReport {
    /// The codex already had pages; nothing was requested.
    pub already_scaffolded: bool,
    pub sections_scaffolded: usize,
    pub chapters_populated: usize,
}

impl Orchestrator {
    /// Scaffold the codex unless some chapter already has pages.
    ///
    /// Sections are processed in order and each result is committed before the
    /// next request. The first failure stops the workflow; sections committed
    /// before it keep their pages.
    pub async fn ensure_scaffolded(&self) -> Result<ScaffoldReport, ApiError> {
        let kind = WorkflowKind::Scaffold;
        let _guard = self.begin(kind)?;

        let snapshot = self.book();
        if snapshot.is_scaffolded() {
            self.complete(kind, "Codex already scaffolded");
            return Ok(ScaffoldReport {
                already_scaffolded: true,
                ..ScaffoldReport::default()
            });
        }

        let mut report = ScaffoldReport::default();
        for (index, section) in snapshot.sections().iter().enumerate() {
            if section.chapters.is_empty() {
                debug!(section = %section.title, "Skipping section without chapters");
                continue;
            }
            report.chapters_populated += self.scaffold_section(kind, index).await?;
            report.sections_scaffolded += 1;
        }

        self.complete(
            kind,
            format!(
                "Scaffolding complete: {} sections, {} chapters outlined",
                report.sections_scaffolded, report.chapters_populated
            ),
        );
        Ok(report)
    }

    /// Re-run the scaffold request for one section, replacing the pages of
    /// every chapter in the reply. Synthesized content of those chapters is lost.
    pub async fn regenerate_section(&self, section: usize) -> Result<ScaffoldReport, ApiError> {
        let book = self.book();
        match book.section(section) {
            Some(found) if !found.chapters.is_empty() => {}
            Some(found) => {
                return Err(ApiError::InvalidSelection(format!(
                    "section \"{}\" has no chapters",
                    found.title
                )))
            }
            None => {
                return Err(ApiError::InvalidSelection(format!(
                    "no section at index {}",
                    section
                )))
            }
        }

        let kind = WorkflowKind::SectionRegeneration;
        let _guard = self.begin(kind)?;
        let chapters_populated = self.scaffold_section(kind, section).await?;

        self.complete(
            kind,
            format!("Section {} regenerated: {} chapters outlined", section + 1, chapters_populated),
        );
        Ok(ScaffoldReport {
            already_scaffolded: false,
            sections_scaffolded: 1,
            chapters_populated,
        })
    }

    /// One scaffold unit. Returns the number of chapters that received pages.
    async fn scaffold_section(&self, kind: WorkflowKind, index: usize) -> Result<usize, ApiError> {
        let invoker = self.invoker()?;
        let book = self.book();
        let Some(section) = book.section(index) else {
            return Ok(0);
        };

        self.report_progress(
            kind,
            format!("Scaffolding section {}: {}", index + 1, section.title),
        );
        let request = ScaffoldRequest::for_section(section);
        let outline = request
            .execute(invoker, &self.settings)
            .await
            .map_err(|e| self.fail(kind, &section.title, e))?;

        let populated = section
            .chapters
            .iter()
            .filter(|chapter| outline.contains_key(&chapter.title))
            .count();
        self.commit(|current| current.with_outline(index, &outline));
        self.emit(OrchestratorEvent::UnitCommitted {
            workflow: kind,
            unit: section.title.clone(),
            path: index.to_string(),
        });
        Ok(populated)
    }
}
