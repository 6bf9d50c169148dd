//! Router Metrics
//!
//! Lock-free counters and a latency histogram recorded on every routed
//! request:
//! - requests, cache hits, outcomes per [`Method`]
//! - pivot and provider fallbacks taken
//! - failures per [`ErrorKind`]
//! - end-to-end routing latency
//!
//! Everything is atomics, so recording never contends with the cache or
//! registry locks. [`RouterMetrics::snapshot`] produces a serializable
//! point-in-time copy for the operational surface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::ErrorKind;
use crate::translation::Method;

// ============================================================================
// Histogram
// ============================================================================

/// Fixed-bucket histogram of millisecond values
#[derive(Debug)]
pub struct Histogram {
    /// Upper bounds of each bucket
    buckets: Vec<u64>,
    /// Count per bucket; the last bucket also takes overflow
    counts: Vec<AtomicU64>,
    total: AtomicU64,
    sum: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
}

impl Histogram {
    /// Create a histogram with the given bucket upper bounds
    #[must_use]
    pub fn new(buckets: Vec<u64>) -> Self {
        let counts = buckets.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            buckets,
            counts,
            total: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            min: AtomicU64::new(u64::MAX),
            max: AtomicU64::new(0),
        }
    }

    /// Buckets suited to translation latency, 5ms to 2 minutes
    #[must_use]
    pub fn latency_default() -> Self {
        Self::new(vec![
            5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000, 120_000,
        ])
    }

    /// Record one value
    pub fn record(&self, value_ms: u64) {
        if self.counts.is_empty() {
            return;
        }
        let idx = self
            .buckets
            .iter()
            .position(|&bound| value_ms <= bound)
            .unwrap_or(self.buckets.len() - 1);

        self.counts[idx].fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(value_ms, Ordering::Relaxed);
        self.min.fetch_min(value_ms, Ordering::Relaxed);
        self.max.fetch_max(value_ms, Ordering::Relaxed);
    }

    /// Record a duration
    pub fn record_duration(&self, elapsed: Duration) {
        self.record(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    }

    /// Point-in-time copy
    #[must_use]
    pub fn snapshot(&self) -> HistogramSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let sum = self.sum.load(Ordering::Relaxed);
        let min = self.min.load(Ordering::Relaxed);

        #[allow(clippy::cast_precision_loss)]
        let mean = if total > 0 {
            sum as f64 / total as f64
        } else {
            0.0
        };

        HistogramSnapshot {
            buckets: self.buckets.clone(),
            counts: self
                .counts
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
            total,
            sum,
            min: if min == u64::MAX { 0 } else { min },
            max: self.max.load(Ordering::Relaxed),
            mean,
        }
    }
}

/// Serializable histogram data
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    /// Bucket upper bounds
    pub buckets: Vec<u64>,
    /// Count per bucket
    pub counts: Vec<u64>,
    /// Values recorded
    pub total: u64,
    /// Sum of values
    pub sum: u64,
    /// Smallest value, 0 when empty
    pub min: u64,
    /// Largest value
    pub max: u64,
    /// Mean value
    pub mean: f64,
}

impl HistogramSnapshot {
    /// Upper bound of the bucket holding the `p` quantile (0.0-1.0)
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn percentile(&self, p: f64) -> u64 {
        if self.total == 0 {
            return 0;
        }
        let target = ((self.total as f64) * p.clamp(0.0, 1.0)).ceil().max(1.0) as u64;
        let mut cumulative = 0u64;
        for (bound, count) in self.buckets.iter().zip(&self.counts) {
            cumulative += count;
            if cumulative >= target {
                return *bound;
            }
        }
        self.buckets.last().copied().unwrap_or(0)
    }

    /// Median
    #[must_use]
    pub fn p50(&self) -> u64 {
        self.percentile(0.5)
    }

    /// 99th percentile
    #[must_use]
    pub fn p99(&self) -> u64 {
        self.percentile(0.99)
    }
}

// ============================================================================
// Counter
// ============================================================================

/// A monotonically increasing atomic counter
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a zeroed counter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value
    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Router Metrics
// ============================================================================

/// Metrics recorded by the router
#[derive(Debug)]
pub struct RouterMetrics {
    started: Instant,
    requests: Counter,
    cache_hits: Counter,
    pivot_fallbacks: Counter,
    provider_fallbacks: Counter,
    by_method: [Counter; 6],
    by_error: [Counter; 7],
    latency: Histogram,
}

impl Default for RouterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterMetrics {
    /// Zeroed metrics
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            requests: Counter::new(),
            cache_hits: Counter::new(),
            pivot_fallbacks: Counter::new(),
            provider_fallbacks: Counter::new(),
            by_method: Default::default(),
            by_error: Default::default(),
            latency: Histogram::latency_default(),
        }
    }

    /// A request entered the router
    pub fn record_request(&self) {
        self.requests.inc();
    }

    /// A request was answered from the cache
    pub fn record_cache_hit(&self) {
        self.cache_hits.inc();
    }

    /// The router fell back to a pivot path
    pub fn record_pivot_fallback(&self) {
        self.pivot_fallbacks.inc();
    }

    /// The router fell back to the external provider
    pub fn record_provider_fallback(&self) {
        self.provider_fallbacks.inc();
    }

    /// A request finished
    pub fn record_outcome(&self, method: Method, error: Option<ErrorKind>, elapsed: Duration) {
        self.by_method[method.index()].inc();
        if let Some(kind) = error {
            if let Some(idx) = ErrorKind::ALL.iter().position(|k| *k == kind) {
                self.by_error[idx].inc();
            }
        }
        self.latency.record_duration(elapsed);
    }

    /// Requests that reached the router
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }

    /// Requests finished with this method
    #[must_use]
    pub fn method_count(&self, method: Method) -> u64 {
        self.by_method[method.index()].get()
    }

    /// Point-in-time copy
    #[must_use]
    pub fn snapshot(&self) -> RouterMetricsSnapshot {
        RouterMetricsSnapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            requests: self.requests.get(),
            cache_hits: self.cache_hits.get(),
            pivot_fallbacks: self.pivot_fallbacks.get(),
            provider_fallbacks: self.provider_fallbacks.get(),
            by_method: Method::ALL
                .iter()
                .map(|m| (m.as_str().to_string(), self.method_count(*m)))
                .collect(),
            failures_by_kind: ErrorKind::ALL
                .iter()
                .zip(&self.by_error)
                .filter(|(_, c)| c.get() > 0)
                .map(|(k, c)| (k.as_str().to_string(), c.get()))
                .collect(),
            latency: self.latency.snapshot(),
        }
    }
}

/// Serializable router metrics
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouterMetricsSnapshot {
    /// Seconds since the router was created
    pub uptime_secs: u64,
    /// Requests that reached the router
    pub requests: u64,
    /// Requests answered from the cache
    pub cache_hits: u64,
    /// Pivot paths attempted
    pub pivot_fallbacks: u64,
    /// Provider fallbacks attempted
    pub provider_fallbacks: u64,
    /// Finished requests per method tag
    pub by_method: Vec<(String, u64)>,
    /// Failed requests per error tag (only non-zero entries)
    pub failures_by_kind: Vec<(String, u64)>,
    /// Routing latency in milliseconds
    pub latency: HistogramSnapshot,
}
