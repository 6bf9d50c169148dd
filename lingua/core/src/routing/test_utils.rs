//! Routing Test Utilities
//!
//! Mock collaborators for exercising the registry and router without any
//! model server. Every mock records how often it was called so tests can
//! assert on initialization and invocation counts, and each can be told to
//! fail, slow down, or block for a given backend id.
//!
//! # Usage
//!
//! ```ignore
//! let loader = Arc::new(MockLoader::new().with_delay(Duration::from_millis(50)));
//! let gate = loader.block("opus-mt-en-de");
//! // ... start acquires ...
//! gate.notify_one();
//! assert_eq!(loader.load_count(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::backend::{
    BackendLoader, CompletionProvider, CompletionRequest, LocalBackend, RemoteModelApi,
};
use crate::error::TranslationError;

use super::table::BackendDescriptor;

// ============================================================================
// Local Backends
// ============================================================================

/// Mock local backend: answers `"[<target>] <text>"`
pub struct MockBackend {
    id: String,
    target: String,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LocalBackend for MockBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn translate(&self, text: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock backend {} crashed", self.id);
        }
        Ok(format!("[{}] {text}", self.target))
    }
}

/// Mock loader with per-backend failure, blocking and call counting
#[derive(Default)]
pub struct MockLoader {
    delay: Option<Duration>,
    loads: AtomicUsize,
    loads_by_id: Mutex<HashMap<String, usize>>,
    failing_loads: Mutex<HashSet<String>>,
    failing_translations: HashSet<String>,
    blocked: Mutex<HashMap<String, Arc<Notify>>>,
    translate_calls: Arc<AtomicUsize>,
}

impl MockLoader {
    /// Loader that succeeds immediately for every backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate slow initialization
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make loading this backend fail
    pub fn fail_load(self, backend_id: &str) -> Self {
        self.failing_loads
            .lock()
            .unwrap()
            .insert(backend_id.to_string());
        self
    }

    /// Let a previously failing backend load
    pub fn allow_load(&self, backend_id: &str) {
        self.failing_loads.lock().unwrap().remove(backend_id);
    }

    /// Make instances of this backend fail every translation
    pub fn fail_translate(mut self, backend_id: &str) -> Self {
        self.failing_translations.insert(backend_id.to_string());
        self
    }

    /// Hold loads of this backend until the returned gate is notified
    pub fn block(&self, backend_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.blocked
            .lock()
            .unwrap()
            .insert(backend_id.to_string(), Arc::clone(&gate));
        gate
    }

    /// Total load attempts
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Load attempts for one backend
    pub fn load_count_for(&self, backend_id: &str) -> usize {
        self.loads_by_id
            .lock()
            .unwrap()
            .get(backend_id)
            .copied()
            .unwrap_or(0)
    }

    /// Translations served by all instances this loader produced
    pub fn translate_count(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendLoader for MockLoader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load(&self, descriptor: &BackendDescriptor) -> anyhow::Result<Arc<dyn LocalBackend>> {
        let id = descriptor.backend_id.clone();
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.loads_by_id.lock().unwrap().entry(id.clone()).or_insert(0) += 1;

        let gate = self.blocked.lock().unwrap().get(&id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_loads.lock().unwrap().contains(&id) {
            anyhow::bail!("model {id} not found");
        }

        Ok(Arc::new(MockBackend {
            fail: self.failing_translations.contains(&id),
            id,
            target: descriptor.pair.target.clone(),
            calls: Arc::clone(&self.translate_calls),
        }))
    }
}

// ============================================================================
// Remote API
// ============================================================================

/// Mock hosted-model API: answers `"<<model>> <text>"`
#[derive(Default)]
pub struct MockRemote {
    delay: Option<Duration>,
    calls: AtomicUsize,
    failing: HashSet<String>,
}

impl MockRemote {
    /// Remote that answers every model immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a slow API
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer this model with HTTP 503
    pub fn fail_model(mut self, model_id: &str) -> Self {
        self.failing.insert(model_id.to_string());
        self
    }

    /// Calls received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteModelApi for MockRemote {
    fn name(&self) -> &str {
        "mock-remote"
    }

    async fn translate(&self, model_id: &str, text: &str) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(model_id) {
            return Err(TranslationError::provider_status(self.name(), 503, "overloaded"));
        }
        Ok(format!("<{model_id}> {text}"))
    }
}

// ============================================================================
// External Provider
// ============================================================================

/// Mock completion provider with a fixed answer
pub struct MockProvider {
    response: Result<String, TranslationError>,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockProvider {
    /// Provider that always answers `response`
    pub fn answering(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Provider that always fails with `error`
    pub fn failing(error: TranslationError) -> Self {
        Self {
            response: Err(error),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Calls received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.response.clone()
    }
}
