//! Translation Backend Integration
//!
//! The collaborators that actually translate, behind the trait seams the
//! router is written against.
//!
//! # Available Backends
//!
//! - **Ollama**: local models on an Ollama-compatible server ([`OllamaLoader`])
//! - **Hosted**: stateless calls to a model-hosting API ([`HostedModelClient`])
//! - **OpenAI**: a general-purpose chat model as last-resort fallback ([`OpenAiProvider`])
//!
//! # Usage
//!
//! ```ignore
//! use lingua_core::backend::{OllamaConfig, OllamaLoader};
//!
//! let loader = Arc::new(OllamaLoader::new(OllamaConfig::default()));
//! let registry = BackendRegistry::new(loader, table, Some(Duration::from_secs(300)));
//! let model = registry.acquire("en", "de").await?;
//! let text = model.translate("Hello").await?;
//! ```

mod hosted;
mod ollama;
mod openai;
mod traits;

pub use hosted::{HostedApiConfig, HostedModelClient};
pub use ollama::{OllamaConfig, OllamaLoader, OllamaModel};
pub use openai::{OpenAiProvider, ProviderConfig};
pub use traits::{
    BackendLoader, CompletionProvider, CompletionRequest, LocalBackend, RemoteModelApi,
};
