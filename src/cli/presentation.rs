//! CLI presentation: text and json formatters per command.

use crate::book::{Book, Selection, CODEX_TITLE};
use crate::error::ApiError;
use crate::orchestrator::{OrchestratorEvent, ScaffoldReport, SynthesisReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionStatus {
    pub index: usize,
    pub title: String,
    pub chapters: usize,
    pub chapters_outlined: usize,
    pub fragments: usize,
    pub synthesized: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodexStatus {
    pub title: String,
    pub scaffolded: bool,
    pub chapters: usize,
    pub fragments: usize,
    pub synthesized: usize,
    pub sections: Vec<SectionStatus>,
}

impl CodexStatus {
    pub fn from_book(book: &Book) -> Self {
        let sections = book
            .sections()
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let pages = section.chapters.iter().flat_map(|c| c.pages.iter());
                SectionStatus {
                    index,
                    title: section.title.clone(),
                    chapters: section.chapters.len(),
                    chapters_outlined: section
                        .chapters
                        .iter()
                        .filter(|c| !c.pages.is_empty())
                        .count(),
                    fragments: pages.clone().count(),
                    synthesized: pages.filter(|p| p.is_synthesized()).count(),
                }
            })
            .collect();
        Self {
            title: CODEX_TITLE.to_string(),
            scaffolded: book.is_scaffolded(),
            chapters: book.chapter_count(),
            fragments: book.page_count(),
            synthesized: book.synthesized_count(),
            sections,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize output: {}", e)))
}

pub fn format_status_json(status: &CodexStatus) -> Result<String, ApiError> {
    to_json(status)
}

pub fn format_status_text(status: &CodexStatus) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Section", "Outlined", "Fragments", "Synthesized"]);
    for section in &status.sections {
        table.add_row(vec![
            section.index.to_string(),
            section.title.clone(),
            format!("{}/{}", section.chapters_outlined, section.chapters),
            section.fragments.to_string(),
            section.synthesized.to_string(),
        ]);
    }

    let phase = if !status.scaffolded {
        "not scaffolded".to_string()
    } else if status.fragments > 0 && status.synthesized == status.fragments {
        "complete".to_string()
    } else {
        format!("{}/{} fragments synthesized", status.synthesized, status.fragments)
    };

    format!(
        "{}\n{} ({} chapters)\n\n{}",
        status.title.bold().underline(),
        phase,
        status.chapters,
        table
    )
}

#[derive(Serialize)]
struct SelectionJson<'a> {
    path: String,
    section: &'a str,
    chapter: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<&'a crate::book::Page>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<&'a [crate::book::Page]>,
}

pub fn format_selection_json(selection: &Selection<'_>) -> Result<String, ApiError> {
    let page = selection.page();
    let json = SelectionJson {
        path: selection.path().to_string(),
        section: &selection.section().title,
        chapter: &selection.chapter().title,
        page,
        pages: page.is_none().then(|| selection.chapter().pages.as_slice()),
    };
    to_json(&json)
}

pub fn format_selection_text(selection: &Selection<'_>) -> String {
    let path = selection.path();
    let chapter = selection.chapter();
    match selection.page() {
        Some(page) => {
            let body = if page.is_synthesized() {
                page.content.clone()
            } else {
                "[This fragment is unsynthesized.]".dimmed().to_string()
            };
            format!(
                "{}\n{} / {}\n\n{}",
                format!("{} {}", path, page.title).bold(),
                selection.section().title,
                chapter.title,
                body
            )
        }
        None => {
            let mut out = format!(
                "{}\n{}\n",
                format!("{} {}", path, chapter.title).bold(),
                selection.section().title
            );
            if chapter.pages.is_empty() {
                out.push_str(&format!("\n{}", "[No fragments in this chapter.]".dimmed()));
                return out;
            }
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["Path", "Fragment", "Status"]);
            for (index, page) in chapter.pages.iter().enumerate() {
                let status = if page.is_synthesized() {
                    format!("{} words", page.content.split_whitespace().count())
                } else {
                    "pending".to_string()
                };
                table.add_row(vec![
                    format!("{}-{}", path, index),
                    page.title.clone(),
                    status,
                ]);
            }
            out.push('\n');
            out.push_str(&table.to_string());
            out
        }
    }
}

pub fn format_scaffold_report(report: &ScaffoldReport) -> String {
    if report.already_scaffolded {
        return "Codex already scaffolded; nothing to do.".to_string();
    }
    format!(
        "Scaffolded {} sections ({} chapters outlined)",
        report.sections_scaffolded, report.chapters_populated
    )
}

pub fn format_synthesis_report(report: &SynthesisReport) -> String {
    if report.chapters_synthesized == 0 {
        return "Every fragment already has content; nothing to synthesize.".to_string();
    }
    format!(
        "Synthesized {} chapters ({} fragments written, {} chapters skipped)",
        report.chapters_synthesized, report.pages_written, report.chapters_skipped
    )
}

/// One stderr line per event; `None` for events not worth printing.
pub fn format_event(event: &OrchestratorEvent) -> Option<String> {
    match event {
        OrchestratorEvent::WorkflowStarted { .. } => None,
        OrchestratorEvent::Progress { message, .. } => {
            Some(format!("{} {}", "→".cyan(), message))
        }
        OrchestratorEvent::UnitCommitted { unit, path, .. } => {
            Some(format!("  {} {} {}", "✓".green(), unit, format!("({})", path).dimmed()))
        }
        OrchestratorEvent::WorkflowCompleted { message, .. } => {
            Some(format!("{}", message.bold()))
        }
        OrchestratorEvent::WorkflowFailed { unit, .. } => {
            Some(format!("{} {}", "✗".red(), format!("failed at \"{}\"", unit).red()))
        }
    }
}
