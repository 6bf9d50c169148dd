//! Request Validation
//!
//! Untrusted input is checked once, at the boundary, before anything is
//! routed, cached or loaded. A rejected request never reaches the cache,
//! so its statistics do not move.
//!
//! Checks are format-only: language codes must look like codes, but
//! whether a pair is actually served is the router's question.

use serde::{Deserialize, Serialize};

use crate::error::TranslationError;
use crate::translation::TranslateRequest;

/// Size limits for request fields
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum text length in characters (default: 5000)
    pub max_text_chars: usize,
    /// Maximum context length in characters (default: 1000)
    pub max_context_chars: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_text_chars: 5000,
            max_context_chars: 1000,
        }
    }
}

/// Validates translation requests against [`ValidationLimits`]
#[derive(Clone, Debug, Default)]
pub struct RequestValidator {
    limits: ValidationLimits,
}

impl RequestValidator {
    /// Create a validator
    #[must_use]
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Active limits
    #[must_use]
    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    /// Check a request; the first violated rule wins
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field.
    pub fn validate(&self, request: &TranslateRequest) -> Result<(), TranslationError> {
        validate_language_code("source_language", &request.source_lang)?;
        validate_language_code("target_language", &request.target_lang)?;
        self.validate_text(&request.text)?;
        self.validate_context(&request.context)
    }

    fn validate_text(&self, text: &str) -> Result<(), TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::validation(
                "source_text",
                "Source text cannot be empty",
            ));
        }
        let chars = text.chars().count();
        if chars > self.limits.max_text_chars {
            return Err(TranslationError::validation(
                "source_text",
                format!(
                    "Source text is too long ({chars} characters, max {})",
                    self.limits.max_text_chars
                ),
            ));
        }
        reject_control_chars("source_text", text)
    }

    fn validate_context(&self, context: &str) -> Result<(), TranslationError> {
        let chars = context.chars().count();
        if chars > self.limits.max_context_chars {
            return Err(TranslationError::validation(
                "context",
                format!(
                    "Context is too long ({chars} characters, max {})",
                    self.limits.max_context_chars
                ),
            ));
        }
        reject_control_chars("context", context)
    }
}

/// Two or three lowercase ASCII letters
fn validate_language_code(field: &str, code: &str) -> Result<(), TranslationError> {
    let well_formed =
        (2..=3).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_lowercase());
    if well_formed {
        Ok(())
    } else {
        Err(TranslationError::validation(
            field,
            format!("Invalid language code '{code}': expected 2-3 lowercase letters"),
        ))
    }
}

fn reject_control_chars(field: &str, value: &str) -> Result<(), TranslationError> {
    match value
        .chars()
        .find(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
    {
        Some(c) => Err(TranslationError::validation(
            field,
            format!("Contains a control character (U+{:04X})", u32::from(c)),
        )),
        None => Ok(()),
    }
}
