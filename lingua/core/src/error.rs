//! Error Taxonomy and Classification
//!
//! Every failure the router can surface is one variant of the closed
//! [`TranslationError`] enum. Errors are built at the point of failure with
//! the structured data that point knows about (field, backend, pair,
//! provider, HTTP status).
//!
//! Failures that originate in dependencies we do not control (a model
//! server's error text, a provider's error body) arrive as plain strings.
//! For those the constructors apply string heuristics that enrich the
//! message with a likely cause. The heuristics only change wording; the
//! variant is chosen by the call site.
//!
//! # Caller-facing Report
//!
//! [`ErrorReport`] is the serializable form handed to callers: a stable
//! tag, the message, structured details, remediation suggestions and a
//! retryability hint.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::translation::LanguagePair;

/// Words in an error's text that mark a transient failure
const TRANSIENT_VOCABULARY: &[&str] = &[
    "network",
    "timeout",
    "connection",
    "rate limit",
    "temporary",
    "unavailable",
];

// =============================================================================
// Error Kind
// =============================================================================

/// Taxonomy tag of a [`TranslationError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request was malformed
    Validation,
    /// A backend could not be initialized
    BackendInit,
    /// A backend was available but translation failed
    TranslationExecution,
    /// The result cache misbehaved
    Cache,
    /// A remote API answered with an error
    RemoteProvider,
    /// A remote API could not be reached in time
    Network,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    /// All kinds, in declaration order
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Validation,
        ErrorKind::BackendInit,
        ErrorKind::TranslationExecution,
        ErrorKind::Cache,
        ErrorKind::RemoteProvider,
        ErrorKind::Network,
        ErrorKind::Unknown,
    ];

    /// Stable tag reported to callers
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::BackendInit => "backend_init_error",
            Self::TranslationExecution => "translation_error",
            Self::Cache => "cache_error",
            Self::RemoteProvider => "remote_provider_error",
            Self::Network => "network_error",
            Self::Unknown => "unknown_error",
        }
    }

    /// Remediation hints for this kind of failure
    #[must_use]
    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            Self::Validation => &[
                "Check that language codes are valid (e.g., 'en', 'es', 'fr')",
                "Ensure source text is not empty and under 5000 characters",
                "Check that the language pair is supported",
            ],
            Self::BackendInit => &[
                "Check that the model server is running and reachable",
                "Try again in a few minutes",
                "Contact support if problem persists",
            ],
            Self::TranslationExecution => &[
                "Try shorter text",
                "Check if language pair is supported",
                "Try again in a few minutes",
            ],
            Self::RemoteProvider => &[
                "Check the provider API key configuration",
                "Verify API quota and billing",
                "Try again later if rate limited",
            ],
            Self::Cache => &[
                "Service will continue without caching",
                "Try again in a few minutes",
            ],
            Self::Network => &[
                "Check network connectivity to the backend",
                "Try again in a few minutes",
            ],
            Self::Unknown => &["Try again later"],
        }
    }

    /// Status code a transport layer should answer with
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::BackendInit => 503,
            _ => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Translation Error
// =============================================================================

/// A classified failure anywhere in the translation pipeline
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TranslationError {
    /// The request was malformed
    #[error("{message}")]
    Validation {
        /// Human-readable message
        message: String,
        /// Name of the offending request field
        field: String,
    },

    /// A backend could not be initialized
    #[error("{message}")]
    BackendInit {
        /// Human-readable message
        message: String,
        /// Backend identifier
        backend: String,
        /// Underlying failure text
        cause: String,
    },

    /// A backend failed while translating
    #[error("{message}")]
    TranslationExecution {
        /// Human-readable message
        message: String,
        /// Language pair being translated
        pair: LanguagePair,
        /// Backend identifier, if one was reached
        backend: Option<String>,
        /// Underlying failure text
        cause: String,
    },

    /// The result cache could not serve an operation
    #[error("{message}")]
    Cache {
        /// Human-readable message
        message: String,
    },

    /// A remote API answered with an error
    #[error("{message}")]
    RemoteProvider {
        /// Human-readable message
        message: String,
        /// Provider name
        provider: String,
        /// HTTP status, when the provider answered
        status: Option<u16>,
        /// Underlying failure text
        cause: String,
    },

    /// A remote API could not be reached, or did not answer in time
    #[error("{message}")]
    Network {
        /// Human-readable message
        message: String,
        /// Provider name or endpoint
        endpoint: String,
    },

    /// An unclassified failure
    #[error("{message}")]
    Unknown {
        /// Human-readable message
        message: String,
    },
}

impl TranslationError {
    // -------------------------------------------------------------------------
    // Constructors
    // -------------------------------------------------------------------------

    /// A malformed request
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.into(),
        }
    }

    /// No descriptor, pivot path or provider can serve the pair
    #[must_use]
    pub fn unsupported_pair(pair: &LanguagePair) -> Self {
        Self::validation(
            "language_pair",
            format!("No translation path available for {pair}"),
        )
    }

    /// Backend initialization failed
    pub fn backend_init(backend: impl Into<String>, cause: impl fmt::Display) -> Self {
        let backend = backend.into();
        let cause = cause.to_string();
        let lower = cause.to_lowercase();

        let mut message = format!("Failed to load backend {backend}");
        if contains_any(&lower, &["http", "connection", "dns", "network"]) {
            message.push_str(" - network error, check connectivity");
        } else if contains_any(&lower, &["cuda", "out of memory", "gpu"]) {
            message.push_str(" - accelerator memory error, try CPU mode");
        } else if contains_any(&lower, &["not found", "404", "no such"]) {
            message.push_str(" - model not found or corrupted");
        } else {
            message.push_str(" - ");
            message.push_str(&cause);
        }

        Self::BackendInit {
            message,
            backend,
            cause,
        }
    }

    /// A backend failed while translating
    pub fn execution(pair: &LanguagePair, backend: Option<&str>, cause: impl fmt::Display) -> Self {
        let cause = cause.to_string();
        let lower = cause.to_lowercase();

        let mut message = format!("Translation failed for {pair}");
        if contains_any(&lower, &["cuda", "out of memory"]) {
            message.push_str(" - accelerator memory error");
        } else if contains_any(&lower, &["token", "too long"]) {
            message.push_str(" - text too long for model");
        } else if lower.contains("network") {
            message.push_str(" - network error");
        } else {
            message.push_str(" - ");
            message.push_str(&cause);
        }

        Self::TranslationExecution {
            message,
            pair: pair.clone(),
            backend: backend.map(str::to_string),
            cause,
        }
    }

    /// The cache could not serve an operation
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// A remote API reported a failure without a usable status
    ///
    /// Transport-sounding causes are classified as [`TranslationError::Network`].
    pub fn provider(provider: impl Into<String>, cause: impl fmt::Display) -> Self {
        let provider = provider.into();
        let cause = cause.to_string();
        let lower = cause.to_lowercase();

        if contains_any(&lower, &["timed out", "timeout", "connection", "dns"]) {
            return Self::network(provider.clone(), format!("{provider} request failed - {cause}"));
        }

        Self::RemoteProvider {
            message: format!("{provider} translation failed{}", provider_hint(&lower, &cause)),
            provider,
            status: None,
            cause,
        }
    }

    /// A remote API answered with a non-success status
    pub fn provider_status(provider: impl Into<String>, status: u16, body: &str) -> Self {
        let provider = provider.into();
        let hint = match status {
            401 | 403 => " - authentication failed, check the API key".to_string(),
            404 => " - model not available".to_string(),
            429 => " - rate limit exceeded".to_string(),
            500..=599 => " - service unavailable".to_string(),
            _ => provider_hint(&body.to_lowercase(), body),
        };

        Self::RemoteProvider {
            message: format!("{provider} translation failed (HTTP {status}){hint}"),
            provider,
            status: Some(status),
            cause: body.to_string(),
        }
    }

    /// A remote API could not be reached
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Classify a transport-level `reqwest` failure
    #[must_use]
    pub fn from_reqwest(provider: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(provider, format!("{provider} request timed out: {err}"))
        } else if err.is_connect() || err.is_request() {
            Self::network(provider, format!("{provider} connection failed: {err}"))
        } else if let Some(status) = err.status() {
            Self::provider_status(provider, status.as_u16(), &err.to_string())
        } else if err.is_decode() {
            Self::provider(provider, format!("malformed response body: {err}"))
        } else {
            Self::provider(provider, err)
        }
    }

    /// An unclassified failure
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Taxonomy tag
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::BackendInit { .. } => ErrorKind::BackendInit,
            Self::TranslationExecution { .. } => ErrorKind::TranslationExecution,
            Self::Cache { .. } => ErrorKind::Cache,
            Self::RemoteProvider { .. } => ErrorKind::RemoteProvider,
            Self::Network { .. } => ErrorKind::Network,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Human-readable message
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message, .. }
            | Self::BackendInit { message, .. }
            | Self::TranslationExecution { message, .. }
            | Self::Cache { message }
            | Self::RemoteProvider { message, .. }
            | Self::Network { message, .. }
            | Self::Unknown { message } => message,
        }
    }

    /// Structured details for the caller
    #[must_use]
    pub fn details(&self) -> BTreeMap<String, String> {
        let mut details = BTreeMap::new();
        match self {
            Self::Validation { field, .. } => {
                details.insert("field".to_string(), field.clone());
            }
            Self::BackendInit { backend, cause, .. } => {
                details.insert("backend".to_string(), backend.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            Self::TranslationExecution {
                pair,
                backend,
                cause,
                ..
            } => {
                details.insert("source_language".to_string(), pair.source.clone());
                details.insert("target_language".to_string(), pair.target.clone());
                if let Some(backend) = backend {
                    details.insert("backend".to_string(), backend.clone());
                }
                details.insert("cause".to_string(), cause.clone());
            }
            Self::RemoteProvider {
                provider,
                status,
                cause,
                ..
            } => {
                details.insert("provider".to_string(), provider.clone());
                if let Some(status) = status {
                    details.insert("status".to_string(), status.to_string());
                }
                if !cause.is_empty() {
                    details.insert("cause".to_string(), cause.clone());
                }
            }
            Self::Network { endpoint, .. } => {
                details.insert("endpoint".to_string(), endpoint.clone());
            }
            Self::Cache { .. } | Self::Unknown { .. } => {}
        }
        details
    }

    /// Whether retrying the same request may succeed
    ///
    /// Validation errors never are and network errors always are. Other
    /// kinds are retryable when their text names a transient condition.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation { .. } => false,
            Self::Network { .. } => true,
            Self::RemoteProvider {
                status: Some(status),
                ..
            } if *status == 429 || *status >= 500 => true,
            _ => {
                let mut text = self.message().to_lowercase();
                if let Self::BackendInit { cause, .. }
                | Self::TranslationExecution { cause, .. }
                | Self::RemoteProvider { cause, .. } = self
                {
                    text.push(' ');
                    text.push_str(&cause.to_lowercase());
                }
                contains_any(&text, TRANSIENT_VOCABULARY)
            }
        }
    }

    /// Remediation hints for this error's kind
    #[must_use]
    pub fn suggestions(&self) -> &'static [&'static str] {
        self.kind().suggestions()
    }

    /// Caller-facing report
    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            error: self.message().to_string(),
            error_type: self.kind().as_str().to_string(),
            details: self.details(),
            suggestions: self.suggestions().iter().map(|s| (*s).to_string()).collect(),
            retryable: self.is_retryable(),
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn provider_hint(lower: &str, raw: &str) -> String {
    if lower.contains("rate limit") {
        " - rate limit exceeded".to_string()
    } else if lower.contains("quota") {
        " - API quota exceeded".to_string()
    } else if contains_any(lower, &["authentication", "unauthorized", "api key"]) {
        " - invalid API key".to_string()
    } else if lower.contains("model") {
        " - model not available".to_string()
    } else if raw.is_empty() {
        String::new()
    } else {
        format!(" - {raw}")
    }
}

// =============================================================================
// Error Report
// =============================================================================

/// Serializable error payload for callers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Human-readable message
    pub error: String,
    /// Stable taxonomy tag (see [`ErrorKind::as_str`])
    pub error_type: String,
    /// Structured details
    pub details: BTreeMap<String, String>,
    /// Remediation hints
    pub suggestions: Vec<String>,
    /// Whether retrying may succeed
    pub retryable: bool,
}

impl ErrorReport {
    /// Report for a failure that escaped classification
    ///
    /// The full diagnostic is logged; the caller only sees a generic
    /// unknown error.
    pub fn unexpected(err: &dyn fmt::Display) -> Self {
        error!(error = %err, "Unexpected error");
        TranslationError::unknown("An unexpected error occurred").report()
    }

    /// Status code a transport layer should answer with
    #[must_use]
    pub fn http_status(&self) -> u16 {
        ErrorKind::ALL
            .iter()
            .find(|kind| kind.as_str() == self.error_type)
            .map_or(500, ErrorKind::http_status)
    }
}

impl From<&TranslationError> for ErrorReport {
    fn from(err: &TranslationError) -> Self {
        err.report()
    }
}
