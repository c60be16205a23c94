//! Synthesis phase: page text for each chapter that still has empty pages.

use super::{Orchestrator, OrchestratorEvent, WorkflowKind};
use crate::book::NodePath;
use crate::error::ApiError;
use crate::generation::SynthesisRequest;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisReport {
    pub chapters_synthesized: usize,
    pub chapters_skipped: usize,
    pub pages_written: usize,
}

impl Orchestrator {
    /// Synthesize every chapter that has at least one empty page.
    ///
    /// Chapters without pages and fully written chapters are skipped, so a
    /// second run after a successful one makes no remote calls.
    pub async fn synthesize_book(&self) -> Result<SynthesisReport, ApiError> {
        let kind = WorkflowKind::BookSynthesis;
        let _guard = self.begin(kind)?;

        let structure = self.book();
        let mut report = SynthesisReport::default();
        for (s, section) in structure.sections().iter().enumerate() {
            for c in 0..section.chapters.len() {
                // re-read: an edit since the last commit may have filled the chapter
                let pending = self
                    .book()
                    .chapter(s, c)
                    .map(|chapter| chapter.needs_synthesis())
                    .unwrap_or(false);
                if !pending {
                    report.chapters_skipped += 1;
                    continue;
                }
                report.pages_written += self.synthesize_unit(kind, NodePath::chapter(s, c)).await?;
                report.chapters_synthesized += 1;
            }
        }

        let message = if report.chapters_synthesized == 0 {
            "Nothing to synthesize: every fragment already has content".to_string()
        } else {
            format!(
                "Synthesis complete: {} chapters, {} fragments written",
                report.chapters_synthesized, report.pages_written
            )
        };
        self.complete(kind, message);
        Ok(report)
    }

    /// Synthesize one chapter on request, rewriting every page it has.
    pub async fn synthesize_chapter(
        &self,
        section: usize,
        chapter: usize,
    ) -> Result<SynthesisReport, ApiError> {
        let path = NodePath::chapter(section, chapter);
        match self.book().chapter(section, chapter) {
            None => {
                return Err(ApiError::InvalidSelection(format!(
                    "{} does not address a chapter",
                    path
                )))
            }
            Some(found) if found.pages.is_empty() => {
                return Err(ApiError::InvalidSelection(format!(
                    "chapter \"{}\" has no fragments yet",
                    found.title
                )))
            }
            Some(_) => {}
        }

        let kind = WorkflowKind::ChapterSynthesis;
        let _guard = self.begin(kind)?;
        let pages_written = self.synthesize_unit(kind, path).await?;

        self.complete(
            kind,
            format!("Chapter {}.{} synthesized", section + 1, chapter + 1),
        );
        Ok(SynthesisReport {
            chapters_synthesized: 1,
            chapters_skipped: 0,
            pages_written,
        })
    }

    /// One synthesis unit. Returns the number of pages that received content.
    async fn synthesize_unit(&self, kind: WorkflowKind, path: NodePath) -> Result<usize, ApiError> {
        let invoker = self.invoker()?;
        let book = self.book();
        let (Some(section), Some(chapter)) =
            (book.section(path.section), book.chapter(path.section, path.chapter))
        else {
            return Ok(0);
        };

        self.report_progress(
            kind,
            format!(
                "Synthesizing {}.{}: {}",
                path.section + 1,
                path.chapter + 1,
                chapter.title
            ),
        );
        let request = SynthesisRequest::for_chapter(&section.title, chapter);
        let contents = request
            .execute(invoker, &self.settings)
            .await
            .map_err(|e| self.fail(kind, &chapter.title, e))?;

        let written = chapter
            .pages
            .iter()
            .filter(|page| contents.contains_key(&page.title))
            .count();
        self.commit(|current| current.with_contents(path.section, path.chapter, &contents));
        self.emit(OrchestratorEvent::UnitCommitted {
            workflow: kind,
            unit: chapter.title.clone(),
            path: path.to_string(),
        });
        Ok(written)
    }
}
