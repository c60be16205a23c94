//! Shared test utilities for integration tests
//!
//! `ScriptedProvider` answers prompts the way a well-behaved model would,
//! deriving replies from the titles listed in each prompt, with optional
//! failures injected by call index.

use aletheia::book::Book;
use aletheia::error::{ProviderError, StorageError};
use aletheia::generation::GenerationSettings;
use aletheia::invocation::{ResilientInvoker, RetryPolicy};
use aletheia::orchestrator::Orchestrator;
use aletheia::provider::{GenerationRequest, GenerationResponse, ModelProviderClient};
use aletheia::store::{
    decode_book, BookRepository, DocumentStore, MemoryDocumentStore, DEFAULT_DOCUMENT_KEY,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Titles listed as `- "title"` lines in a prompt, in order.
pub fn listed_titles(prompt: &str) -> Vec<String> {
    prompt
        .lines()
        .filter_map(|line| line.strip_prefix("- \""))
        .filter_map(|rest| rest.strip_suffix('"'))
        .map(str::to_string)
        .collect()
}

pub fn is_scaffold_prompt(prompt: &str) -> bool {
    prompt.contains("single key \"chapters\"")
}

/// Blocks the first call until released, so a test can act mid-workflow.
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct ScriptedProvider {
    failures: Mutex<HashMap<usize, ProviderError>>,
    prompts: Mutex<Vec<String>>,
    gate: Option<Arc<Gate>>,
    gated: AtomicBool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the call with zero-based index `call`.
    pub fn failing_at(self, call: usize, error: ProviderError) -> Self {
        self.failures.lock().insert(call, error);
        self
    }

    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    fn reply(prompt: &str) -> String {
        let titles = listed_titles(prompt);
        if is_scaffold_prompt(prompt) {
            let chapters: Vec<_> = titles
                .iter()
                .map(|chapter| {
                    json!({
                        "chapterTitle": chapter,
                        "titles": (1..=5).map(|n| format!("{} / fragment {}", chapter, n)).collect::<Vec<_>>(),
                    })
                })
                .collect();
            json!({ "chapters": chapters }).to_string()
        } else {
            let logs: Vec<_> = titles
                .iter()
                .map(|page| json!({ "title": page, "content": format!("Text of {}.\nSecond paragraph.", page) }))
                .collect();
            json!({ "logs": logs }).to_string()
        }
    }
}

#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let index = {
            let mut prompts = self.prompts.lock();
            prompts.push(request.prompt.clone());
            prompts.len() - 1
        };

        if let Some(gate) = &self.gate {
            if !self.gated.swap(true, Ordering::SeqCst) {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }

        let failure = self.failures.lock().remove(&index);
        if let Some(error) = failure {
            return Err(error);
        }
        Ok(GenerationResponse {
            text: Self::reply(&request.prompt),
            model: request.model.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// Store whose writes always fail.
#[derive(Default)]
pub struct FailingStore;

impl DocumentStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Backend("disk full".to_string()))
    }
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

pub fn orchestrator_over(
    provider: Arc<ScriptedProvider>,
    store: Arc<dyn DocumentStore>,
) -> Orchestrator {
    let invoker = ResilientInvoker::new(provider, fast_policy());
    Orchestrator::new(
        invoker,
        BookRepository::with_default_key(store),
        GenerationSettings::new("scripted-model"),
    )
}

pub fn orchestrator(provider: ScriptedProvider) -> (Orchestrator, Arc<ScriptedProvider>, Arc<MemoryDocumentStore>) {
    let provider = Arc::new(provider);
    let store = Arc::new(MemoryDocumentStore::new());
    let orchestrator = orchestrator_over(provider.clone(), store.clone());
    (orchestrator, provider, store)
}

/// Codex as last written to `store`.
pub fn persisted(store: &MemoryDocumentStore) -> Book {
    let bytes = store
        .get(DEFAULT_DOCUMENT_KEY)
        .unwrap()
        .expect("codex was never persisted");
    decode_book(&bytes).expect("persisted codex does not decode")
}
