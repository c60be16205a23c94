//! Integration tests for the sled-backed codex store

use aletheia::book::{codex_template, NodePath};
use aletheia::store::{BookRepository, DocumentStore, SledDocumentStore};
use std::sync::Arc;
use tempfile::TempDir;

use crate::integration::test_utils::{orchestrator_over, ScriptedProvider};

#[tokio::test]
async fn test_progress_survives_reopening_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store");

    {
        let store = Arc::new(SledDocumentStore::new(&path).unwrap());
        let orchestrator = orchestrator_over(Arc::new(ScriptedProvider::new()), store);
        orchestrator.ensure_scaffolded().await.unwrap();
        orchestrator.synthesize_chapter(2, 3).await.unwrap();
        orchestrator.edit_page(NodePath::page(0, 0, 0), "kept").unwrap();
    }

    let store = Arc::new(SledDocumentStore::new(&path).unwrap());
    let book = BookRepository::with_default_key(store).load();
    assert_eq!(book.page_count(), 200);
    assert_eq!(book.synthesized_count(), 6);
    assert_eq!(book.page(0, 0, 0).unwrap().content, "kept");
    assert!(!book.chapter(2, 3).unwrap().needs_synthesis());
}

#[test]
fn test_unrecognised_document_falls_back_to_template() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SledDocumentStore::new(temp_dir.path().join("store")).unwrap());
    let repository = BookRepository::new(store.clone(), "codex");

    for garbage in [&b"not json"[..], br#"[{"title":"Some Other Book","chapters":[]}]"#, b"[]"] {
        store.set("codex", garbage).unwrap();
        assert_eq!(repository.load(), codex_template());
    }
}

#[test]
fn test_keys_are_independent() {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> =
        Arc::new(SledDocumentStore::new(temp_dir.path().join("store")).unwrap());
    let first = BookRepository::new(store.clone(), "first");
    let second = BookRepository::new(store, "second");

    let mut outline = aletheia::book::Outline::new();
    outline.insert(codex_template().chapter(0, 0).unwrap().title.clone(), vec!["p".to_string()]);
    first.save(&codex_template().with_outline(0, &outline).unwrap()).unwrap();

    assert!(first.load().is_scaffolded());
    assert!(!second.load().is_scaffolded());
}
