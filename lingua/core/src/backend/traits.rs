//! Translation Backend Traits
//!
//! The seams between the router and the things that actually translate.
//!
//! # Three Kinds of Collaborator
//!
//! - [`BackendLoader`] / [`LocalBackend`]: a loader performs the slow,
//!   fallible initialization of a local model and hands back an instance
//!   with a single `translate(text)` capability. The registry owns the
//!   instances.
//! - [`RemoteModelApi`]: a stateless outbound call naming a model and the
//!   input text. Nothing is initialized or kept.
//! - [`CompletionProvider`]: a general-purpose language model that
//!   receives an instruction plus the text and answers free-form.
//!
//! Local seams report `anyhow::Result`; the registry and router classify
//! those failures. The remote seams speak HTTP we control, so they
//! classify at the point of failure and return [`TranslationError`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TranslationError;
use crate::routing::BackendDescriptor;

/// An initialized, ready-to-invoke local translation backend
#[async_trait]
pub trait LocalBackend: Send + Sync {
    /// Backend identifier (e.g. the model name)
    fn id(&self) -> &str;

    /// Translate text for the pair this instance was loaded for
    async fn translate(&self, text: &str) -> anyhow::Result<String>;
}

/// Performs the expensive initialization of local backends
///
/// Implementations should do blocking work on a blocking thread
/// (`tokio::task::spawn_blocking`) so that concurrent preloads overlap.
#[async_trait]
pub trait BackendLoader: Send + Sync {
    /// Loader name for logs (e.g. "ollama")
    fn name(&self) -> &str;

    /// Initialize the backend described by `descriptor`
    async fn load(&self, descriptor: &BackendDescriptor) -> anyhow::Result<Arc<dyn LocalBackend>>;
}

/// A stateless remote model-hosting API
#[async_trait]
pub trait RemoteModelApi: Send + Sync {
    /// Provider name for logs and error details
    fn name(&self) -> &str;

    /// Translate `text` with the hosted model `model_id`
    async fn translate(&self, model_id: &str, text: &str) -> Result<String, TranslationError>;
}

/// An instruction sent to a [`CompletionProvider`]
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// System instruction
    pub instruction: String,
    /// User content
    pub text: String,
    /// Maximum tokens in the response
    pub max_tokens: u32,
    /// Sampling temperature (0.0-1.0)
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a request with default sampling parameters
    pub fn new(instruction: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            text: text.into(),
            max_tokens: 1000,
            temperature: 0.3,
        }
    }

    /// Build the translation instruction for a language pair
    #[must_use]
    pub fn translation(source: &str, target: &str, context: &str, text: &str) -> Self {
        let mut instruction = format!(
            "You are a professional translator. Translate the user's text from {source} to {target}."
        );
        if !context.trim().is_empty() {
            instruction.push_str(" Context: ");
            instruction.push_str(context.trim());
            instruction.push('.');
        }
        instruction.push_str(" Respond with the translation only.");
        Self::new(instruction, text)
    }
}

/// A general-purpose external language-model provider
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs and error details
    fn name(&self) -> &str;

    /// Send the request and return the raw response text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TranslationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_translation_instruction_embeds_languages() {
        let request = CompletionRequest::translation("zh", "ja", "", "你好");
        assert!(request.instruction.contains("from zh to ja"));
        assert!(!request.instruction.contains("Context"));
        assert_eq!(request.text, "你好");
    }

    #[test]
    fn test_translation_instruction_embeds_context() {
        let request = CompletionRequest::translation("en", "de", "  medical report ", "dose");
        assert!(request.instruction.contains("Context: medical report."));
    }
}
