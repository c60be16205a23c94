//! Integration tests for the scaffold phase

use aletheia::book::{codex_template, Book, Chapter, Section, FIRST_SECTION_TITLE};
use aletheia::error::{ApiError, FailureKind, ProviderError};
use aletheia::orchestrator::{OrchestratorEvent, WorkflowKind};
use aletheia::store::{BookRepository, MemoryDocumentStore};
use std::sync::Arc;

use crate::integration::test_utils::{
    is_scaffold_prompt, listed_titles, orchestrator, orchestrator_over, persisted, ScriptedProvider,
};

#[tokio::test]
async fn test_scaffold_outlines_every_chapter_in_order() {
    let (orchestrator, provider, store) = orchestrator(ScriptedProvider::new());

    let report = orchestrator.ensure_scaffolded().await.unwrap();

    assert!(!report.already_scaffolded);
    assert_eq!(report.sections_scaffolded, 8);
    assert_eq!(report.chapters_populated, 40);
    assert_eq!(provider.call_count(), 8);

    let template = codex_template();
    for (index, prompt) in provider.prompts().iter().enumerate() {
        assert!(is_scaffold_prompt(prompt));
        assert_eq!(listed_titles(prompt), template.sections()[index].chapter_titles());
    }

    let book = orchestrator.book();
    assert_eq!(book.page_count(), 200);
    assert_eq!(book.synthesized_count(), 0);
    assert_eq!(persisted(&store), *book);
}

#[tokio::test]
async fn test_scaffold_is_skipped_once_done() {
    let (orchestrator, provider, _) = orchestrator(ScriptedProvider::new());
    orchestrator.ensure_scaffolded().await.unwrap();

    let report = orchestrator.ensure_scaffolded().await.unwrap();

    assert!(report.already_scaffolded);
    assert_eq!(provider.call_count(), 8);
}

#[tokio::test]
async fn test_failure_keeps_committed_sections() {
    let provider = ScriptedProvider::new().failing_at(2, ProviderError::Transport("connection reset".to_string()));
    let (orchestrator, provider, store) = orchestrator(provider);
    let third = codex_template().sections()[2].title.clone();

    let err = orchestrator.ensure_scaffolded().await.unwrap_err();

    match &err {
        ApiError::GenerationFailed { unit, .. } => assert_eq!(unit, &third),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.failure_kind(), Some(FailureKind::Transport));
    assert_eq!(provider.call_count(), 3);

    let book = orchestrator.book();
    for (index, section) in book.sections().iter().enumerate() {
        let outlined = section.chapters.iter().all(|c| !c.pages.is_empty());
        assert_eq!(outlined, index < 2, "section {index}");
    }
    assert_eq!(persisted(&store), *book);

    let state = orchestrator.state();
    assert!(state.status.is_idle());
    assert!(state.last_error.unwrap().contains(&third));
}

#[tokio::test]
async fn test_rerun_after_failure_leaves_partial_outline_alone() {
    let provider = ScriptedProvider::new().failing_at(1, ProviderError::Decode("truncated".to_string()));
    let (orchestrator, provider, _) = orchestrator(provider);
    orchestrator.ensure_scaffolded().await.unwrap_err();

    // one outlined section counts as scaffolded
    let report = orchestrator.ensure_scaffolded().await.unwrap();
    assert!(report.already_scaffolded);
    assert_eq!(provider.call_count(), 2);

    // the missing section can be filled explicitly
    orchestrator.regenerate_section(1).await.unwrap();
    assert_eq!(provider.call_count(), 3);
    assert!(orchestrator.book().sections()[1].chapters.iter().all(|c| c.pages.len() == 5));
}

#[tokio::test]
async fn test_regenerate_section_replaces_written_pages() {
    let (orchestrator, _, _) = orchestrator(ScriptedProvider::new());
    orchestrator.ensure_scaffolded().await.unwrap();
    orchestrator.synthesize_chapter(0, 0).await.unwrap();
    assert!(orchestrator.book().chapter(0, 0).unwrap().pages.iter().all(|p| p.is_synthesized()));

    let report = orchestrator.regenerate_section(0).await.unwrap();

    assert_eq!(report.chapters_populated, 5);
    let book = orchestrator.book();
    assert!(book.chapter(0, 0).unwrap().pages.iter().all(|p| !p.is_synthesized()));
    assert_eq!(book.page_count(), 200);
}

#[tokio::test]
async fn test_scaffold_events() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let (orchestrator, _, _) = orchestrator(ScriptedProvider::new());
    let orchestrator = orchestrator.with_events(tx);

    orchestrator.ensure_scaffolded().await.unwrap();
    drop(orchestrator);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(matches!(events.first(), Some(OrchestratorEvent::WorkflowStarted { workflow: WorkflowKind::Scaffold })));
    assert!(matches!(events.last(), Some(OrchestratorEvent::WorkflowCompleted { .. })));
    let committed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            OrchestratorEvent::UnitCommitted { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(committed, (0..8).map(|i| i.to_string()).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_section_without_chapters_is_skipped() {
    let seeded = Book::new(vec![
        Section::new(FIRST_SECTION_TITLE, vec![Chapter::new("A")]),
        Section::new("Empty", vec![]),
        Section::new("Third", vec![Chapter::new("C")]),
    ]);
    let store = Arc::new(MemoryDocumentStore::new());
    BookRepository::with_default_key(store.clone()).save(&seeded).unwrap();
    let provider = Arc::new(ScriptedProvider::new());
    let orchestrator = orchestrator_over(provider.clone(), store.clone());

    let report = orchestrator.ensure_scaffolded().await.unwrap();

    assert_eq!(report.sections_scaffolded, 2);
    assert_eq!(report.chapters_populated, 2);
    assert_eq!(provider.call_count(), 2);
    let prompts = provider.prompts();
    assert_eq!(listed_titles(&prompts[0]), vec!["A".to_string()]);
    assert_eq!(listed_titles(&prompts[1]), vec!["C".to_string()]);

    let book = orchestrator.book();
    assert!(book.sections()[1].chapters.is_empty());
    assert_eq!(book.chapter(0, 0).unwrap().pages.len(), 5);
    assert_eq!(book.chapter(2, 0).unwrap().pages.len(), 5);
    assert_eq!(persisted(&store), *book);
    assert!(orchestrator.state().last_error.is_none());
}
