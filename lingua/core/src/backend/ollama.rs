//! Ollama Local Backend
//!
//! Local translation models served by an Ollama-compatible model server.
//!
//! # Ollama API
//!
//! - `/api/tags` - List installed models (checked before loading)
//! - `/api/generate` - Generate a completion; an empty prompt loads the
//!   model into memory and keeps it resident for `keep_alive`
//!
//! Loading is the expensive, failure-prone step the registry guards;
//! translation is a single non-streaming generate call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{BackendLoader, LocalBackend};
use crate::routing::BackendDescriptor;

/// Connection settings for the local model server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// How long the server keeps a loaded model resident
    pub keep_alive: String,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            keep_alive: "30m".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl OllamaConfig {
    /// Base URL of the server
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

/// Loads local models on an Ollama server
#[derive(Clone)]
pub struct OllamaLoader {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaLoader {
    /// Create a loader
    #[must_use]
    pub fn new(config: OllamaConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            config,
            http_client,
        }
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.config.base_url())
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url())
    }

    /// Whether the server has `model` installed
    ///
    /// # Errors
    ///
    /// Fails when the server is unreachable or answers with an error.
    pub async fn has_model(&self, model: &str) -> anyhow::Result<bool> {
        let response = self
            .http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let data: serde_json::Value = response.json().await?;
        let installed = data
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .any(|name| model_matches(name, model))
            })
            .unwrap_or(false);
        Ok(installed)
    }
}

/// Installed names carry an implicit `:latest` tag
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || installed
            .strip_suffix(":latest")
            .is_some_and(|base| base == wanted)
}

#[async_trait]
impl BackendLoader for OllamaLoader {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn load(&self, descriptor: &BackendDescriptor) -> anyhow::Result<Arc<dyn LocalBackend>> {
        let model = descriptor.backend_id.as_str();
        if !self.has_model(model).await? {
            anyhow::bail!(
                "model {model} not found on {}",
                self.config.base_url()
            );
        }

        // An empty prompt makes the server load the model and keep it resident
        let response = self
            .http_client
            .post(self.generate_url())
            .json(&serde_json::json!({
                "model": model,
                "prompt": "",
                "stream": false,
                "keep_alive": self.config.keep_alive,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }
        debug!(model, "Model resident on Ollama server");

        Ok(Arc::new(OllamaModel {
            model: model.to_string(),
            source: descriptor.pair.source.clone(),
            target: descriptor.pair.target.clone(),
            generate_url: self.generate_url(),
            keep_alive: self.config.keep_alive.clone(),
            http_client: self.http_client.clone(),
        }))
    }
}

/// A model resident on the Ollama server, bound to one language pair
pub struct OllamaModel {
    model: String,
    source: String,
    target: String,
    generate_url: String,
    keep_alive: String,
    http_client: reqwest::Client,
}

impl OllamaModel {
    fn build_prompt(&self, text: &str) -> String {
        build_prompt(&self.source, &self.target, text)
    }
}

fn build_prompt(source: &str, target: &str, text: &str) -> String {
    format!(
        "Translate the following text from {source} to {target}. \
         Respond with the translation only.\n\n{text}"
    )
}

#[async_trait]
impl LocalBackend for OllamaModel {
    fn id(&self) -> &str {
        &self.model
    }

    async fn translate(&self, text: &str) -> anyhow::Result<String> {
        let response = self
            .http_client
            .post(&self.generate_url)
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": self.build_prompt(text),
                "stream": false,
                "keep_alive": self.keep_alive,
                "options": { "temperature": 0.1 },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let data: serde_json::Value = response.json().await?;
        let translated = data
            .get("response")
            .and_then(|r| r.as_str())
            .map(str::trim)
            .unwrap_or_default();
        if translated.is_empty() {
            anyhow::bail!("Ollama returned an empty response for model {}", self.model);
        }
        Ok(translated.to_string())
    }
}
