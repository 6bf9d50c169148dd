//! Lingua Core - Translation Backend Registry and Routing
//!
//! This crate decides, for every translation request, which backend
//! answers it: a locally loaded model, a remote model-hosting API, a
//! two-hop pivot through an intermediate language, or an external
//! general-purpose provider. It caches successful results and classifies
//! every failure into a stable taxonomy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Callers (CLI, batch, tests)                 │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ TranslateRequest
//! ┌───────────────────────────────┼─────────────────────────────────┐
//! │                       TranslationService                        │
//! │  ┌────────────────┐   ┌───────┴────────┐   ┌─────────────────┐  │
//! │  │RequestValidator│──►│     Router     │──►│TranslationCache │  │
//! │  └────────────────┘   └───┬────────┬───┘   └─────────────────┘  │
//! │                           │        │                            │
//! │         ┌─────────────────┘        └──────────────┐             │
//! │  ┌──────┴─────────┐  ┌─────────────────┐  ┌───────┴──────────┐  │
//! │  │DescriptorTable │  │ BackendRegistry │  │ TranslationError │  │
//! │  │ (static pairs) │  │ (lazy, per-pair)│  │ (classified)     │  │
//! │  └────────────────┘  └────────┬────────┘  └──────────────────┘  │
//! └───────────────────────────────┼─────────────────────────────────┘
//!                                 │
//!          ┌──────────────────────┼──────────────────────┐
//!          v                      v                      v
//!   ┌─────────────┐      ┌────────────────┐     ┌────────────────┐
//!   │ OllamaLoader│      │HostedModelClient│    │ OpenAiProvider │
//!   └─────────────┘      └────────────────┘     └────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`TranslationService`]: The context object owning every shared component
//! - [`Router`]: Direct, pivot and provider routing with caching
//! - [`BackendRegistry`]: At-most-once initialization of local backends
//! - [`TranslationCache`]: Bounded LRU with TTL expiry
//! - [`TranslationError`]: The classified error taxonomy
//!
//! # Quick Start
//!
//! ```ignore
//! use lingua_core::{load_config, TranslateRequest, TranslationService};
//!
//! let config = load_config()?;
//! let service = TranslationService::from_config(&config)?;
//! service.preload().await;
//!
//! let result = service
//!     .translate(&TranslateRequest::new("en", "de", "Hello"))
//!     .await?;
//! println!("{:?} via {:?}", result.text, result.method);
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Backend traits and the Ollama, hosted API and OpenAI clients
//! - [`cache`]: Result cache
//! - [`config`]: TOML configuration with environment overrides
//! - [`error`]: Error taxonomy, heuristics and caller-facing reports
//! - [`routing`]: Descriptor table, registry, pivot planning, router and metrics
//! - [`service`]: The service context object
//! - [`translation`]: Request and result types
//! - [`validation`]: Request validation

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod routing;
pub mod service;
pub mod translation;
pub mod validation;

// Re-exports for convenience
pub use backend::{
    BackendLoader, CompletionProvider, CompletionRequest, LocalBackend, RemoteModelApi,
};
pub use cache::{CacheConfig, CacheEntrySummary, CacheStats, TranslationCache};
pub use error::{ErrorKind, ErrorReport, TranslationError};
pub use service::{CacheReport, Collaborators, ServiceSnapshot, TranslationService};
pub use translation::{
    BackendKind, BackendPreference, LanguagePair, Method, TranslateRequest, TranslationResult,
};
pub use validation::{RequestValidator, ValidationLimits};

// Routing exports
pub use routing::{
    BackendDescriptor, BackendRegistry, DescriptorTable, PreloadReport, Router,
    RouterMetricsSnapshot, RoutingConfig,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigSource,
    LinguaConfig, LinguaToml,
};
