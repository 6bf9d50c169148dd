//! Hosted Model API Client
//!
//! Stateless translation through a remote model-hosting service in the
//! style of the Hugging Face inference API:
//!
//! ```text
//! POST {base_url}/models/{model_id}
//! Authorization: Bearer <token>          (when a token is configured)
//! {"inputs": "<text>"}
//!
//! 200 [{"translation_text": "..."}]      or {"translation_text": "..."}
//! ```
//!
//! Retryable failures (network errors, 429, 5xx) are retried with the
//! configured exponential backoff. Anything else, including a 2xx with a
//! body we cannot read a translation from, fails immediately.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::traits::RemoteModelApi;
use crate::error::TranslationError;
use crate::routing::RetryConfig;

const PROVIDER: &str = "hosted";

/// Settings for the hosted model API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedApiConfig {
    /// Base URL of the service
    pub base_url: String,
    /// Environment variable holding the bearer token
    pub token_env: String,
    /// Per-attempt HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for HostedApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".to_string(),
            token_env: "HF_TOKEN".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Client for the hosted model API
pub struct HostedModelClient {
    base_url: String,
    token: Option<String>,
    retry: RetryConfig,
    http_client: reqwest::Client,
}

impl HostedModelClient {
    /// Create a client; the token is read from `config.token_env`
    #[must_use]
    pub fn new(config: &HostedApiConfig, retry: RetryConfig) -> Self {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        if token.is_none() {
            debug!(env = %config.token_env, "No hosted API token set, calling anonymously");
        }
        Self::with_token(config, retry, token)
    }

    /// Create a client with an explicit token
    #[must_use]
    pub fn with_token(config: &HostedApiConfig, retry: RetryConfig, token: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            retry,
            http_client,
        }
    }

    fn model_url(&self, model_id: &str) -> String {
        format!("{}/models/{model_id}", self.base_url)
    }

    async fn attempt(&self, model_id: &str, text: &str) -> Result<String, TranslationError> {
        let mut request = self
            .http_client
            .post(self.model_url(model_id))
            .json(&serde_json::json!({ "inputs": text }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
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
        parse_translation(&body).ok_or_else(|| {
            TranslationError::provider(PROVIDER, format!("malformed response body: {body}"))
        })
    }
}

/// Read the translation from either response shape
fn parse_translation(body: &serde_json::Value) -> Option<String> {
    let item = match body {
        serde_json::Value::Array(items) => items.first()?,
        other => other,
    };
    let text = item
        .get("translation_text")
        .or_else(|| item.get("generated_text"))?
        .as_str()?
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl RemoteModelApi for HostedModelClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn translate(&self, model_id: &str, text: &str) -> Result<String, TranslationError> {
        let mut attempt = 0;
        loop {
            match self.attempt(model_id, text).await {
                Ok(translated) => return Ok(translated),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let backoff = self.retry.backoff_for_attempt(attempt);
                    warn!(
                        model = model_id,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Hosted API call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
