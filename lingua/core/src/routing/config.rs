//! Routing Configuration
//!
//! Calibration constants, pivot candidates, timeouts and the default
//! descriptor set. Every struct deserializes from the `[routing]` and
//! `[[pairs]]` sections of the TOML file with `#[serde(default)]`, so a
//! partial file only overrides what it names.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::translation::{BackendKind, LanguagePair};

// ============================================================================
// Confidence Calibration
// ============================================================================

/// Fixed confidence reported for each way of producing a translation
///
/// These are calibration constants, not learned values. A pivot path must
/// always report less confidence than any direct path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Direct translation by a local backend
    pub local: f32,
    /// Direct translation by the remote model-hosting API
    pub remote: f32,
    /// Two-hop translation through a pivot language
    pub pivot: f32,
    /// Translation by the external general-purpose provider
    pub provider: f32,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            local: 0.9,
            remote: 0.85,
            pivot: 0.7,
            provider: 0.8,
        }
    }
}

impl ConfidenceConfig {
    /// Confidence for a direct path through a backend of this kind
    #[must_use]
    pub fn direct(&self, kind: BackendKind) -> f32 {
        match kind {
            BackendKind::Local => self.local,
            BackendKind::RemoteApi => self.remote,
        }
    }

    /// Check ranges and ordering
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("local", self.local),
            ("remote", self.remote),
            ("pivot", self.pivot),
            ("provider", self.provider),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("confidence.{name} must be within [0, 1], got {value}"));
            }
        }
        if self.pivot >= self.local.min(self.remote) {
            return Err(format!(
                "confidence.pivot ({}) must be lower than every direct confidence",
                self.pivot
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Retry Configuration
// ============================================================================

/// Retry policy for calls to remote APIs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,

    /// Initial backoff delay
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay
    pub max_backoff_ms: u64,

    /// Backoff multiplier
    pub backoff_multiplier: f32,

    /// Add jitter to backoff
    pub use_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 250,
            max_backoff_ms: 4_000,
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Calculate backoff duration for attempt N (0-indexed)
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff_ms as f64
            * f64::from(self.backoff_multiplier).powi(attempt.min(30) as i32);
        let capped = base.min(self.max_backoff_ms as f64);

        let duration_ms = if self.use_jitter {
            // Up to 25% jitter
            let jitter = rand::random::<f64>() * 0.25;
            (capped * (1.0 + jitter)) as u64
        } else {
            capped as u64
        };

        Duration::from_millis(duration_ms)
    }
}

// ============================================================================
// Descriptor Configuration
// ============================================================================

/// One `[[pairs]]` entry: a direct backend for a language pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConfig {
    /// Source language code
    pub source: String,
    /// Target language code
    pub target: String,
    /// Where translations for this pair run
    pub kind: BackendKind,
    /// Model or backend identifier
    pub backend: String,
}

impl PairConfig {
    /// Create a pair entry
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: BackendKind,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            backend: backend.into(),
        }
    }

    /// The language pair this entry describes
    #[must_use]
    pub fn pair(&self) -> LanguagePair {
        LanguagePair::new(self.source.as_str(), self.target.as_str())
    }
}

/// The descriptor set used when the config file names none
#[must_use]
pub fn default_pairs() -> Vec<PairConfig> {
    let local = [
        ("es", "Helsinki-NLP/opus-mt-en-es"),
        ("fr", "Helsinki-NLP/opus-mt-en-fr"),
        ("de", "Helsinki-NLP/opus-mt-en-de"),
        ("it", "Helsinki-NLP/opus-mt-en-it"),
        ("pt", "Helsinki-NLP/opus-mt-tc-big-en-pt"),
    ];
    let remote_from_en = [
        ("ru", "Helsinki-NLP/opus-mt-en-ru"),
        ("zh", "Helsinki-NLP/opus-mt-en-zh"),
        ("ja", "Helsinki-NLP/opus-mt-en-jap"),
        ("ko", "Helsinki-NLP/opus-mt-tc-big-en-ko"),
        ("ar", "Helsinki-NLP/opus-mt-en-ar"),
    ];
    let remote_to_en = [
        ("es", "Helsinki-NLP/opus-mt-es-en"),
        ("fr", "Helsinki-NLP/opus-mt-fr-en"),
        ("de", "Helsinki-NLP/opus-mt-de-en"),
        ("it", "Helsinki-NLP/opus-mt-it-en"),
        ("pt", "Helsinki-NLP/opus-mt-mul-en"),
        ("ru", "Helsinki-NLP/opus-mt-ru-en"),
        ("zh", "Helsinki-NLP/opus-mt-zh-en"),
        ("ja", "Helsinki-NLP/opus-mt-jap-en"),
        ("ko", "Helsinki-NLP/opus-mt-ko-en"),
        ("ar", "Helsinki-NLP/opus-mt-ar-en"),
    ];

    let mut pairs = Vec::with_capacity(local.len() + remote_from_en.len() + remote_to_en.len());
    pairs.extend(
        local
            .iter()
            .map(|(target, model)| PairConfig::new("en", *target, BackendKind::Local, *model)),
    );
    pairs.extend(
        remote_from_en
            .iter()
            .map(|(target, model)| PairConfig::new("en", *target, BackendKind::RemoteApi, *model)),
    );
    pairs.extend(
        remote_to_en
            .iter()
            .map(|(source, model)| PairConfig::new(*source, "en", BackendKind::RemoteApi, *model)),
    );
    pairs
}

// ============================================================================
// Router Configuration
// ============================================================================

/// Routing behavior
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// First pivot candidate
    pub universal_pivot: String,

    /// Further pivot candidates, tried in order after the universal pivot
    pub common_pivots: Vec<String>,

    /// Pairs initialized eagerly at startup, written as `"en-es"`
    pub preload: Vec<String>,

    /// Upper bound on one local backend initialization (`None` = unbounded)
    ///
    /// Written as seconds in TOML, with 0 for unbounded.
    #[serde(with = "unbounded_secs")]
    pub init_timeout_secs: Option<u64>,

    /// Upper bound on one call to a remote API, retries included
    pub remote_timeout_secs: u64,

    /// Confidence calibration
    pub confidence: ConfidenceConfig,

    /// Retry policy for remote calls
    pub retry: RetryConfig,
}

/// `Option<u64>` seconds as a plain number, 0 standing for `None`
mod unbounded_secs {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(secs: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(secs.unwrap_or(0))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok((secs > 0).then_some(secs))
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            universal_pivot: "en".to_string(),
            common_pivots: vec!["es".to_string(), "fr".to_string(), "de".to_string()],
            preload: ["en-es", "en-fr", "en-de", "en-it", "en-pt"]
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            init_timeout_secs: Some(300),
            remote_timeout_secs: 30,
            confidence: ConfidenceConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl RoutingConfig {
    /// Local initialization bound
    #[must_use]
    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_secs.map(Duration::from_secs)
    }

    /// Remote call bound
    #[must_use]
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    /// Parsed preload pairs; entries that do not parse are skipped
    #[must_use]
    pub fn preload_pairs(&self) -> Vec<LanguagePair> {
        self.preload
            .iter()
            .filter_map(|p| LanguagePair::parse(p))
            .collect()
    }
}
