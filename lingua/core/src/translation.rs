//! Translation Requests and Results
//!
//! The value types that flow through the router: the request a caller
//! submits, the language pair it names, the backend kinds a descriptor can
//! point at, and the single closed result type every routing outcome is
//! reported through.
//!
//! A [`TranslationResult`] always carries an explicit [`Method`] tag. A
//! `Method::Failed` result never carries text and always has zero
//! confidence; the constructors below are the only way this crate builds
//! results, so callers can match exhaustively on the method.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorReport, TranslationError};

// =============================================================================
// Language Pair
// =============================================================================

/// An ordered (source, target) language code tuple
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguagePair {
    /// Source language code (e.g. "en")
    pub source: String,
    /// Target language code (e.g. "de")
    pub target: String,
}

impl LanguagePair {
    /// Create a new language pair
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Parse a pair written as `"en-de"`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (source, target) = value.trim().split_once('-')?;
        if source.is_empty() || target.is_empty() || target.contains('-') {
            return None;
        }
        Some(Self::new(source, target))
    }

    /// Whether source and target are the same language
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

// =============================================================================
// Backend Kinds and Preferences
// =============================================================================

/// Where a descriptor's translations are executed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// A locally initialized model instance owned by the registry
    Local,
    /// A stateless call to the remote model-hosting API
    RemoteApi,
}

impl BackendKind {
    /// Stable lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::RemoteApi => "remote-api",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kinds of backend a caller is willing to have its request served by
///
/// The preference is part of the cache fingerprint, so the same text routed
/// with different preferences is cached separately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Any backend, in the normal routing order
    #[default]
    Auto,
    /// Only locally initialized backends
    Local,
    /// Only the remote model-hosting API
    Remote,
    /// Only the external general-purpose provider
    Provider,
}

impl BackendPreference {
    /// Stable lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Provider => "provider",
        }
    }

    /// Whether a descriptor of this kind may serve the request
    #[must_use]
    pub fn allows_kind(&self, kind: BackendKind) -> bool {
        matches!(
            (self, kind),
            (Self::Auto, _)
                | (Self::Local, BackendKind::Local)
                | (Self::Remote, BackendKind::RemoteApi)
        )
    }

    /// Whether the external provider may serve the request
    #[must_use]
    pub fn allows_provider(&self) -> bool {
        matches!(self, Self::Auto | Self::Provider)
    }
}

impl std::str::FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "local" => Ok(Self::Local),
            "remote" | "api" => Ok(Self::Remote),
            "provider" | "openai" => Ok(Self::Provider),
            other => Err(format!("unknown backend preference: {other}")),
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// A translation request as submitted by a caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateRequest {
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
    /// Text to translate
    pub text: String,
    /// Optional free-form context; empty when absent
    #[serde(default)]
    pub context: String,
    /// Backend kinds the caller accepts
    #[serde(default)]
    pub preference: BackendPreference,
}

impl TranslateRequest {
    /// Create a request with no context and automatic backend selection
    pub fn new(
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            text: text.into(),
            context: String::new(),
            preference: BackendPreference::Auto,
        }
    }

    /// Attach context
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Restrict the backends that may serve this request
    #[must_use]
    pub fn with_preference(mut self, preference: BackendPreference) -> Self {
        self.preference = preference;
        self
    }

    /// The language pair this request names
    #[must_use]
    pub fn pair(&self) -> LanguagePair {
        LanguagePair::new(self.source_lang.as_str(), self.target_lang.as_str())
    }
}

// =============================================================================
// Result
// =============================================================================

/// How a result was produced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Source and target are the same language; text returned unchanged
    Direct,
    /// A locally initialized backend translated the text
    Local,
    /// The remote model-hosting API translated the text
    Api,
    /// Two hops through a pivot language
    Pivot,
    /// The external general-purpose provider translated the text
    #[serde(rename = "openai")]
    OpenAi,
    /// Every avenue failed
    Failed,
}

impl Method {
    /// All methods, in declaration order
    pub const ALL: [Method; 6] = [
        Method::Direct,
        Method::Local,
        Method::Api,
        Method::Pivot,
        Method::OpenAi,
        Method::Failed,
    ];

    /// Stable lowercase tag
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Local => "local",
            Self::Api => "api",
            Self::Pivot => "pivot",
            Self::OpenAi => "openai",
            Self::Failed => "failed",
        }
    }

    /// Position in [`Method::ALL`]
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Direct => 0,
            Self::Local => 1,
            Self::Api => 2,
            Self::Pivot => 3,
            Self::OpenAi => 4,
            Self::Failed => 5,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping attached to a result served from the cache
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Milliseconds since the entry was created
    pub age_ms: u64,
    /// Number of hits on the entry, including this one
    pub access_count: u64,
}

/// The outcome of routing one request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Translated text; `None` when the method is `Failed`
    pub text: Option<String>,
    /// Calibrated confidence in [0, 1]
    pub confidence: f32,
    /// Identifier of the backend (or backends, for a pivot) that answered
    pub backend: Option<String>,
    /// How the result was produced
    pub method: Method,
    /// Number of hops for pivot translations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hops: Option<u8>,
    /// Classified error for failed results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    /// Present when the result was served from the cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheMetadata>,
}

impl TranslationResult {
    /// A successful single-step translation
    pub fn success(
        text: impl Into<String>,
        confidence: f32,
        backend: impl Into<String>,
        method: Method,
    ) -> Self {
        Self {
            text: Some(text.into()),
            confidence: confidence.clamp(0.0, 1.0),
            backend: Some(backend.into()),
            method,
            hops: None,
            error: None,
            cache: None,
        }
    }

    /// A successful two-hop pivot translation
    pub fn pivot(text: impl Into<String>, confidence: f32, backend: impl Into<String>) -> Self {
        Self {
            hops: Some(2),
            ..Self::success(text, confidence, backend, Method::Pivot)
        }
    }

    /// A failed translation carrying the classified error
    #[must_use]
    pub fn failed(error: &TranslationError) -> Self {
        Self {
            text: None,
            confidence: 0.0,
            backend: None,
            method: Method::Failed,
            hops: None,
            error: Some(error.report()),
            cache: None,
        }
    }

    /// Whether the translation produced text
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.method != Method::Failed && self.text.is_some()
    }

    /// Copy of this result marked as served from the cache
    #[must_use]
    pub fn with_cache_metadata(&self, metadata: CacheMetadata) -> Self {
        Self {
            cache: Some(metadata),
            ..self.clone()
        }
    }

    /// Whether this result was served from the cache
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }
}
