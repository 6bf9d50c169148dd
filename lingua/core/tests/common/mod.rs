//! Shared collaborators for lingua-core integration tests
//!
//! Each mock counts its calls so tests can assert how often a backend was
//! loaded or invoked through the public service API.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use lingua_core::config::LinguaConfig;
use lingua_core::routing::PairConfig;
use lingua_core::{
    BackendDescriptor, BackendKind, BackendLoader, Collaborators, CompletionProvider,
    CompletionRequest, LocalBackend, RemoteModelApi, TranslationError, TranslationService,
};

/// Local backend that prefixes the target language: `"de:Hello"`
pub struct PrefixBackend {
    id: String,
    target: String,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LocalBackend for PrefixBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn translate(&self, text: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}:{text}", self.target))
    }
}

/// Loader with a configurable delay and failing backend ids
#[derive(Default)]
pub struct CountingLoader {
    pub delay: Option<Duration>,
    pub failing: Mutex<HashSet<String>>,
    pub loads: AtomicUsize,
    pub translations: Arc<AtomicUsize>,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing(self, backend_id: &str) -> Self {
        self.failing.lock().unwrap().insert(backend_id.to_string());
        self
    }

    pub fn recover(&self, backend_id: &str) {
        self.failing.lock().unwrap().remove(backend_id);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn translations(&self) -> usize {
        self.translations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendLoader for CountingLoader {
    fn name(&self) -> &str {
        "counting"
    }

    async fn load(&self, descriptor: &BackendDescriptor) -> anyhow::Result<Arc<dyn LocalBackend>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&descriptor.backend_id) {
            anyhow::bail!("CUDA out of memory while loading {}", descriptor.backend_id);
        }
        Ok(Arc::new(PrefixBackend {
            id: descriptor.backend_id.clone(),
            target: descriptor.pair.target.clone(),
            calls: Arc::clone(&self.translations),
        }))
    }
}

/// Remote API that wraps text in the model id: `"(model)text"`
#[derive(Default)]
pub struct WrappingRemote {
    pub calls: AtomicUsize,
}

#[async_trait]
impl RemoteModelApi for WrappingRemote {
    fn name(&self) -> &str {
        "wrapping-remote"
    }

    async fn translate(&self, model_id: &str, text: &str) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("({model_id}){text}"))
    }
}

/// Provider with a fixed answer
pub struct FixedProvider(pub Result<String, TranslationError>);

#[async_trait]
impl CompletionProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed-provider"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, TranslationError> {
        self.0.clone()
    }
}

/// Config with the given pairs, no preload and default everything else
pub fn config_with(pairs: Vec<PairConfig>) -> LinguaConfig {
    let mut config = LinguaConfig::default();
    config.pairs = pairs;
    config.routing.preload = Vec::new();
    config
}

/// `en->de` local only
pub fn en_de_config() -> LinguaConfig {
    config_with(vec![PairConfig::new(
        "en",
        "de",
        BackendKind::Local,
        "opus-mt-en-de",
    )])
}

/// Service over the given collaborators
pub fn service(
    config: &LinguaConfig,
    loader: Arc<CountingLoader>,
    remote: Option<Arc<WrappingRemote>>,
    provider: Option<FixedProvider>,
) -> TranslationService {
    let collaborators = Collaborators {
        loader,
        remote: remote.map(|r| r as Arc<dyn RemoteModelApi>),
        provider: provider.map(|p| Arc::new(p) as Arc<dyn CompletionProvider>),
    };
    TranslationService::new(config, collaborators).expect("valid test config")
}
