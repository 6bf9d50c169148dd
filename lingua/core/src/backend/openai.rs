//! OpenAI-Compatible Provider
//!
//! The last-resort fallback: a general-purpose chat model asked to act as
//! a translator. Any service speaking the OpenAI chat completions API
//! works.
//!
//! ```text
//! POST {base_url}/v1/chat/completions
//! {"model", "messages": [system: instruction, user: text], "temperature", "max_tokens"}
//!
//! 200 {"choices": [{"message": {"content": "..."}}]}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::traits::{CompletionProvider, CompletionRequest};
use crate::error::TranslationError;

const PROVIDER: &str = "openai";

/// Settings for the external provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Whether the provider may be used at all
    pub enabled: bool,
    /// Base URL of the API
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Chat-completions client used as a translation provider
pub struct OpenAiProvider {
    base_url: String,
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl OpenAiProvider {
    /// Build the provider if it is enabled and its API key is set
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => {
                info!(model = %config.model, "External translation provider enabled");
                Some(Self::new(config, key))
            }
            _ => {
                warn!(
                    env = %config.api_key_env,
                    "Provider enabled but API key is not set, leaving it disabled"
                );
                None
            }
        }
    }

    /// Create a provider with an explicit API key
    #[must_use]
    pub fn new(config: &ProviderConfig, api_key: String) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            http_client,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.instruction },
                { "role": "user", "content": request.text },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }
}

/// `choices[0].message.content`
fn parse_content(body: &serde_json::Value) -> Option<String> {
    body.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.trim().to_string())
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, TranslationError> {
        let response = self
            .http_client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| TranslationError::from_reqwest(PROVIDER, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::provider_status(
                PROVIDER,
                status.as_u16(),
                &body,
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslationError::from_reqwest(PROVIDER, &e))?;
        parse_content(&body).ok_or_else(|| {
            TranslationError::provider(PROVIDER, "response had no choices[0].message.content")
        })
    }
}
