//! Integration tests for the synthesis phase and workflow exclusion

use aletheia::book::NodePath;
use aletheia::error::{ApiError, FailureKind, InvocationError, ProviderError};
use aletheia::orchestrator::{Orchestrator, WorkflowKind, WorkflowStatus};
use aletheia::store::MemoryDocumentStore;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::integration::test_utils::{
    listed_titles, orchestrator_over, persisted, FailingStore, Gate, ScriptedProvider,
};

/// A store holding a fully outlined, unwritten codex.
async fn scaffolded_store() -> Arc<MemoryDocumentStore> {
    let store = Arc::new(MemoryDocumentStore::new());
    orchestrator_over(Arc::new(ScriptedProvider::new()), store.clone())
        .ensure_scaffolded()
        .await
        .unwrap();
    store
}

async fn synthesizer(provider: ScriptedProvider) -> (Orchestrator, Arc<ScriptedProvider>, Arc<MemoryDocumentStore>) {
    let store = scaffolded_store().await;
    let provider = Arc::new(provider);
    (orchestrator_over(provider.clone(), store.clone()), provider, store)
}

#[tokio::test]
async fn test_synthesize_book_writes_every_fragment() {
    let (orchestrator, provider, store) = synthesizer(ScriptedProvider::new()).await;

    let report = orchestrator.synthesize_book().await.unwrap();

    assert_eq!(report.chapters_synthesized, 40);
    assert_eq!(report.pages_written, 200);
    assert_eq!(provider.call_count(), 40);

    let book = orchestrator.book();
    assert_eq!(book.synthesized_count(), 200);
    let first = book.chapter(0, 0).unwrap();
    assert_eq!(listed_titles(&provider.prompts()[0]), first.page_titles());
    assert!(first.pages[0].content.starts_with("Text of "));
    assert_eq!(persisted(&store), *book);
}

#[tokio::test]
async fn test_second_synthesis_makes_no_calls() {
    let (orchestrator, provider, _) = synthesizer(ScriptedProvider::new()).await;
    orchestrator.synthesize_book().await.unwrap();

    let report = orchestrator.synthesize_book().await.unwrap();

    assert_eq!(report.chapters_synthesized, 0);
    assert_eq!(report.chapters_skipped, 40);
    assert_eq!(provider.call_count(), 40);
}

#[tokio::test]
async fn test_failure_stops_and_resume_picks_up_the_rest() {
    let failing = ScriptedProvider::new().failing_at(
        6,
        ProviderError::Http {
            status: 500,
            message: "internal".to_string(),
        },
    );
    let (orchestrator, provider, store) = synthesizer(failing).await;

    let err = orchestrator.synthesize_book().await.unwrap_err();

    assert_eq!(err.failure_kind(), Some(FailureKind::Transport));
    assert_eq!(provider.call_count(), 7);
    let book = orchestrator.book();
    assert_eq!(book.synthesized_count(), 30);
    // seventh chapter overall is section 2, chapter 2
    assert!(book.chapter(1, 1).unwrap().needs_synthesis());
    assert!(!book.chapter(1, 0).unwrap().needs_synthesis());
    assert_eq!(persisted(&store), *book);
    assert!(orchestrator.state().status.is_idle());

    let report = orchestrator.synthesize_book().await.unwrap();
    assert_eq!(report.chapters_synthesized, 34);
    assert_eq!(report.chapters_skipped, 6);
    assert_eq!(orchestrator.book().synthesized_count(), 200);
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let provider = ScriptedProvider::new().failing_at(
        0,
        ProviderError::Http {
            status: 429,
            message: "quota".to_string(),
        },
    );
    let (orchestrator, provider, _) = synthesizer(provider).await;

    orchestrator.synthesize_chapter(0, 0).await.unwrap();

    assert_eq!(provider.call_count(), 2);
    assert!(!orchestrator.book().chapter(0, 0).unwrap().needs_synthesis());
}

#[tokio::test]
async fn test_rate_limit_exhaustion_names_the_chapter() {
    let quota = || ProviderError::Http {
        status: 429,
        message: "quota".to_string(),
    };
    let provider = ScriptedProvider::new()
        .failing_at(0, quota())
        .failing_at(1, quota())
        .failing_at(2, quota());
    let (orchestrator, provider, _) = synthesizer(provider).await;
    let title = orchestrator.book().chapter(0, 0).unwrap().title.clone();

    let err = orchestrator.synthesize_book().await.unwrap_err();

    assert_eq!(provider.call_count(), 3);
    match err {
        ApiError::GenerationFailed { unit, source } => {
            assert_eq!(unit, title);
            assert!(matches!(source, InvocationError::RateLimited { attempts: 3, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(orchestrator.book().synthesized_count(), 0);
}

#[tokio::test]
async fn test_second_workflow_is_rejected_while_one_runs() {
    let store = scaffolded_store().await;
    let gate = Arc::new(Gate {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let provider = Arc::new(ScriptedProvider::new().gated(gate.clone()));
    let orchestrator = orchestrator_over(provider.clone(), store);
    let hand_written: Vec<String> = (0..5).map(|p| format!("hand written {p}")).collect();

    let running = orchestrator.synthesize_book();
    let interfere = async {
        gate.entered.notified().await;
        let busy = orchestrator.synthesize_chapter(1, 0).await;
        let reset = orchestrator.reset();
        let state = orchestrator.state();
        // edits stay allowed; filling a whole chapter makes the workflow skip it
        for (p, text) in hand_written.iter().enumerate() {
            orchestrator.edit_page(NodePath::page(0, 1, p), text.clone()).unwrap();
        }
        gate.release.notify_one();
        (busy, reset, state)
    };
    let (report, (busy, reset, state)) = tokio::join!(running, interfere);

    assert!(matches!(busy, Err(ApiError::WorkflowBusy { .. })));
    assert!(matches!(reset, Err(ApiError::WorkflowBusy { .. })));
    assert_eq!(state.status, WorkflowStatus::Running(WorkflowKind::BookSynthesis));

    let report = report.unwrap();
    assert_eq!(report.chapters_synthesized, 39);
    assert_eq!(report.chapters_skipped, 1);
    assert_eq!(provider.call_count(), 39);

    let book = orchestrator.book();
    let kept: Vec<String> = book.chapter(0, 1).unwrap().pages.iter().map(|p| p.content.clone()).collect();
    assert_eq!(kept, hand_written);
    assert_eq!(book.synthesized_count(), 200);
    assert!(orchestrator.state().status.is_idle());
}

#[tokio::test]
async fn test_persistence_failure_does_not_fail_workflow() {
    let provider = Arc::new(ScriptedProvider::new());
    let orchestrator = orchestrator_over(provider.clone(), Arc::new(FailingStore));

    orchestrator.ensure_scaffolded().await.unwrap();
    let report = orchestrator.synthesize_chapter(0, 0).await.unwrap();

    assert_eq!(report.pages_written, 5);
    assert_eq!(provider.call_count(), 9);
    assert!(orchestrator.book().is_scaffolded());
    assert!(orchestrator.state().last_error.is_none());
}
