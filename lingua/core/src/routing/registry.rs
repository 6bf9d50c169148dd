//! Backend Instance Registry
//!
//! Owns the initialized local backend instances, one per language pair,
//! and guarantees each is initialized at most once no matter how many
//! requests race for it.
//!
//! # Double-Checked Locking
//!
//! ```text
//! acquire(en, de)
//!   │
//!   ├── instances[en-de]?  ── yes ──► return (shard read, no guard)
//!   │
//!   ├── guards[en-de] (created atomically on first demand)
//!   │     └── lock().await          ◄── only same-pair callers wait here
//!   │
//!   ├── instances[en-de]?  ── yes ──► return (another caller finished first)
//!   │
//!   └── loader.load() under timeout
//!         ├── Ok  ──► publish into instances, then release guard
//!         └── Err ──► release guard, nothing cached, next call retries
//! ```
//!
//! Guards are per pair and never removed while the registry is live, so
//! callers for different pairs never block each other and a pair's guard
//! is never swapped out from under a waiter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendLoader, LocalBackend};
use crate::error::TranslationError;
use crate::translation::{BackendKind, LanguagePair};

use super::table::DescriptorTable;

/// Outcome of [`BackendRegistry::preload`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    /// Pairs that are now loaded
    pub loaded: Vec<LanguagePair>,
    /// Pairs that failed, with the classified message
    pub failed: Vec<(LanguagePair, String)>,
}

impl PreloadReport {
    /// Whether every requested pair loaded
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runtime store of initialized local backends
pub struct BackendRegistry {
    /// Published instances; read without taking any guard
    instances: DashMap<LanguagePair, Arc<dyn LocalBackend>>,

    /// One load guard per pair, created on first demand
    guards: DashMap<LanguagePair, Arc<Mutex<()>>>,

    /// Performs initialization
    loader: Arc<dyn BackendLoader>,

    /// Descriptors naming the backend for each pair
    table: Arc<DescriptorTable>,

    /// Bound on one initialization
    init_timeout: Option<Duration>,

    init_attempts: AtomicU64,
    init_failures: AtomicU64,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new(
        loader: Arc<dyn BackendLoader>,
        table: Arc<DescriptorTable>,
        init_timeout: Option<Duration>,
    ) -> Self {
        Self {
            instances: DashMap::new(),
            guards: DashMap::new(),
            loader,
            table,
            init_timeout,
            init_attempts: AtomicU64::new(0),
            init_failures: AtomicU64::new(0),
        }
    }

    /// Get the instance for a pair, initializing it on first demand
    ///
    /// # Errors
    ///
    /// Returns a [`TranslationError::BackendInit`] when the pair has no
    /// local descriptor, or initialization fails or times out. Failures are
    /// not remembered; the next call tries again.
    pub async fn acquire(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Arc<dyn LocalBackend>, TranslationError> {
        let pair = LanguagePair::new(source, target);

        // Fast path: published instances need no guard
        if let Some(instance) = self.instances.get(&pair) {
            return Ok(Arc::clone(instance.value()));
        }

        let descriptor = match self.table.lookup(source, target) {
            Some(d) if d.kind == BackendKind::Local => d,
            Some(d) => {
                return Err(TranslationError::backend_init(
                    d.backend_id.as_str(),
                    format!("{pair} is served by the {} backend, not a local one", d.kind),
                ))
            }
            None => {
                return Err(TranslationError::backend_init(
                    pair.to_string(),
                    "no local backend configured for this pair",
                ))
            }
        };

        let guard = Arc::clone(
            self.guards
                .entry(pair.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let _held = guard.lock().await;

        // Another caller may have published while we waited
        if let Some(instance) = self.instances.get(&pair) {
            debug!(pair = %pair, "Backend loaded by a concurrent caller");
            return Ok(Arc::clone(instance.value()));
        }

        self.init_attempts.fetch_add(1, Ordering::Relaxed);
        info!(
            pair = %pair,
            backend = %descriptor.backend_id,
            loader = self.loader.name(),
            "Loading local backend"
        );
        let started = Instant::now();

        let loaded = match self.init_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.loader.load(descriptor)).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!(
                    "initialization did not finish within {}s",
                    limit.as_secs_f64()
                )),
            },
            None => self.loader.load(descriptor).await,
        };

        match loaded {
            Ok(instance) => {
                self.instances.insert(pair.clone(), Arc::clone(&instance));
                info!(
                    pair = %pair,
                    backend = %descriptor.backend_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Local backend ready"
                );
                Ok(instance)
            }
            Err(e) => {
                self.init_failures.fetch_add(1, Ordering::Relaxed);
                let err = TranslationError::backend_init(descriptor.backend_id.as_str(), &e);
                error!(pair = %pair, error = %err, "Local backend failed to load");
                Err(err)
            }
        }
    }

    /// Eagerly acquire a set of pairs concurrently
    ///
    /// Individual failures are logged and reported; they do not stop the
    /// remaining pairs from loading.
    pub async fn preload(&self, pairs: &[LanguagePair]) -> PreloadReport {
        info!(count = pairs.len(), "Preloading local backends");

        let outcomes = join_all(pairs.iter().map(|pair| async move {
            let outcome = self.acquire(&pair.source, &pair.target).await;
            (pair.clone(), outcome)
        }))
        .await;

        let mut report = PreloadReport::default();
        for (pair, outcome) in outcomes {
            match outcome {
                Ok(_) => report.loaded.push(pair),
                Err(e) => {
                    warn!(pair = %pair, error = %e, "Preload failed, continuing");
                    report.failed.push((pair, e.to_string()));
                }
            }
        }

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Preload finished"
        );
        report
    }

    /// Drop every instance and guard
    ///
    /// Intended for shutdown; not meant to race with `acquire`.
    pub fn release_all(&self) {
        let released = self.instances.len();
        self.instances.clear();
        self.guards.clear();
        info!(released, "Released all local backends");
    }

    /// Whether a pair has a published instance
    #[must_use]
    pub fn is_loaded(&self, pair: &LanguagePair) -> bool {
        self.instances.contains_key(pair)
    }

    /// Number of published instances
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.instances.len()
    }

    /// Pairs with published instances, sorted
    #[must_use]
    pub fn loaded_pairs(&self) -> Vec<LanguagePair> {
        let mut pairs: Vec<LanguagePair> =
            self.instances.iter().map(|e| e.key().clone()).collect();
        pairs.sort();
        pairs
    }

    /// Initializations started since creation
    #[must_use]
    pub fn init_attempts(&self) -> u64 {
        self.init_attempts.load(Ordering::Relaxed)
    }

    /// Initializations that failed or timed out
    #[must_use]
    pub fn init_failures(&self) -> u64 {
        self.init_failures.load(Ordering::Relaxed)
    }
}
