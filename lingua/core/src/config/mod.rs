//! TOML Configuration File Support
//!
//! Configuration for the translation service, loaded from a TOML file at
//! `~/.config/lingua/config.toml` and overridden by environment variables.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! The daemon's `--config` flag (or `LINGUA_CONFIG`) only changes which file
//! is read. Secrets are never part of the file: the provider and hosted API
//! name the environment variable their key lives in.
//!
//! # Example Configuration
//!
//! ```toml
//! [cache]
//! max_size = 5000
//! ttl_secs = 600
//!
//! [routing]
//! universal_pivot = "en"
//! common_pivots = ["es", "fr", "de"]
//! preload = ["en-de"]
//! init_timeout_secs = 120      # 0 = unbounded
//!
//! [routing.confidence]
//! pivot = 0.6
//!
//! [local]
//! host = "localhost"
//! port = 11434
//!
//! [provider]
//! enabled = true
//! model = "gpt-4o-mini"
//!
//! [[pairs]]
//! source = "en"
//! target = "de"
//! kind = "local"
//! backend = "opus-mt-en-de"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{HostedApiConfig, OllamaConfig, ProviderConfig};
use crate::cache::CacheConfig;
use crate::routing::{
    default_pairs, ConfidenceConfig, DescriptorTable, PairConfig, RetryConfig, RoutingConfig,
};
use crate::translation::{BackendKind, LanguagePair};
use crate::validation::ValidationLimits;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Where the effective configuration came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Built-in defaults only
    #[default]
    Default,
    /// TOML configuration file
    File,
    /// At least one environment variable override
    Env,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::File => write!(f, "config file"),
            Self::Env => write!(f, "environment"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[cache]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheToml {
    /// Maximum resident entries
    pub max_size: Option<usize>,
    /// Entry lifetime in seconds
    pub ttl_secs: Option<u64>,
    /// Cache lock wait bound in milliseconds
    pub lock_timeout_ms: Option<u64>,
}

/// `[routing]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingToml {
    /// First pivot candidate
    pub universal_pivot: Option<String>,
    /// Further pivot candidates
    pub common_pivots: Option<Vec<String>>,
    /// Pairs initialized at startup
    pub preload: Option<Vec<String>>,
    /// Local initialization bound in seconds (0 = unbounded)
    pub init_timeout_secs: Option<u64>,
    /// Remote call bound in seconds
    pub remote_timeout_secs: Option<u64>,
    /// `[routing.confidence]`
    pub confidence: Option<ConfidenceConfig>,
    /// `[routing.retry]`
    pub retry: Option<RetryConfig>,
}

/// `[local]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalToml {
    /// Model server host
    pub host: Option<String>,
    /// Model server port
    pub port: Option<u16>,
    /// How long loaded models stay resident
    pub keep_alive: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// `[hosted]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedToml {
    /// Base URL of the hosting service
    pub base_url: Option<String>,
    /// Environment variable holding the token
    pub token_env: Option<String>,
    /// Per-attempt timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// `[provider]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderToml {
    /// Whether the external provider may be used
    pub enabled: Option<bool>,
    /// Base URL of the API
    pub base_url: Option<String>,
    /// Chat model name
    pub model: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// `[validation]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationToml {
    /// Maximum text length in characters
    pub max_text_chars: Option<usize>,
    /// Maximum context length in characters
    pub max_context_chars: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinguaToml {
    /// `[cache]`
    pub cache: CacheToml,
    /// `[routing]`
    pub routing: RoutingToml,
    /// `[local]`
    pub local: LocalToml,
    /// `[hosted]`
    pub hosted: HostedToml,
    /// `[provider]`
    pub provider: ProviderToml,
    /// `[validation]`
    pub validation: ValidationToml,
    /// `[[pairs]]`; replaces the built-in table when present
    pub pairs: Option<Vec<PairConfig>>,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Effective configuration after defaults, file and environment
#[derive(Clone, Debug, Serialize)]
pub struct LinguaConfig {
    /// Result cache
    pub cache: CacheConfig,
    /// Routing behavior
    pub routing: RoutingConfig,
    /// Local model server
    pub local: OllamaConfig,
    /// Remote model-hosting API
    pub hosted: HostedApiConfig,
    /// External provider
    pub provider: ProviderConfig,
    /// Request limits
    pub validation: ValidationLimits,
    /// Direct backends, one per pair
    pub pairs: Vec<PairConfig>,

    /// Path to the config file that was loaded (if any)
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    #[serde(skip)]
    source: ConfigSource,
}

impl Default for LinguaConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            routing: RoutingConfig::default(),
            local: OllamaConfig::default(),
            hosted: HostedApiConfig::default(),
            provider: ProviderConfig::default(),
            validation: ValidationLimits::default(),
            pairs: default_pairs(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl LinguaConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.cache.max_size == 0 {
            return invalid("cache.max_size must be greater than 0".to_string());
        }
        if self.cache.ttl_secs == 0 {
            return invalid("cache.ttl_secs must be greater than 0".to_string());
        }
        for (field, secs) in [
            ("routing.remote_timeout_secs", self.routing.remote_timeout_secs),
            ("local.request_timeout_secs", self.local.request_timeout_secs),
            ("hosted.request_timeout_secs", self.hosted.request_timeout_secs),
            ("provider.request_timeout_secs", self.provider.request_timeout_secs),
        ] {
            if secs == 0 {
                return invalid(format!("{field} must be greater than 0"));
            }
        }
        if self.routing.universal_pivot.trim().is_empty() {
            return invalid("routing.universal_pivot must not be empty".to_string());
        }
        if self.validation.max_text_chars == 0 {
            return invalid("validation.max_text_chars must be greater than 0".to_string());
        }
        if let Err(msg) = self.routing.confidence.validate() {
            return invalid(format!("routing.confidence: {msg}"));
        }
        if let Err(e) = DescriptorTable::from_config(&self.pairs) {
            return invalid(format!("pairs: {e}"));
        }

        for entry in &self.routing.preload {
            let Some(pair) = LanguagePair::parse(entry) else {
                return invalid(format!(
                    "routing.preload: '{entry}' is not a pair like \"en-de\""
                ));
            };
            let is_local = self
                .pairs
                .iter()
                .any(|p| p.pair() == pair && p.kind == BackendKind::Local);
            if !is_local {
                return invalid(format!(
                    "routing.preload: {pair} has no local descriptor"
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/lingua/config.toml` or
/// `~/.config/lingua/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("lingua").join("config.toml"))
}

/// Load and validate configuration from the default path
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or
/// parsed, or if the result fails validation. A missing config file is not
/// an error (defaults are used).
pub fn load_config() -> Result<LinguaConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load and validate configuration from a specific path
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<LinguaConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration reading overrides through `env`
fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LinguaConfig, ConfigError> {
    let mut config = LinguaConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: LinguaToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut LinguaConfig, toml: LinguaToml) {
    // Cache
    if let Some(size) = toml.cache.max_size {
        config.cache.max_size = size;
    }
    if let Some(ttl) = toml.cache.ttl_secs {
        config.cache.ttl_secs = ttl;
    }
    if let Some(ms) = toml.cache.lock_timeout_ms {
        config.cache.lock_timeout_ms = ms;
    }

    // Routing
    if let Some(pivot) = toml.routing.universal_pivot {
        config.routing.universal_pivot = pivot;
    }
    if let Some(pivots) = toml.routing.common_pivots {
        config.routing.common_pivots = pivots;
    }
    if let Some(preload) = toml.routing.preload {
        config.routing.preload = preload;
    }
    if let Some(secs) = toml.routing.init_timeout_secs {
        config.routing.init_timeout_secs = (secs > 0).then_some(secs);
    }
    if let Some(secs) = toml.routing.remote_timeout_secs {
        config.routing.remote_timeout_secs = secs;
    }
    if let Some(confidence) = toml.routing.confidence {
        config.routing.confidence = confidence;
    }
    if let Some(retry) = toml.routing.retry {
        config.routing.retry = retry;
    }

    // Local model server
    if let Some(host) = toml.local.host {
        config.local.host = host;
    }
    if let Some(port) = toml.local.port {
        config.local.port = port;
    }
    if let Some(keep_alive) = toml.local.keep_alive {
        config.local.keep_alive = keep_alive;
    }
    if let Some(secs) = toml.local.request_timeout_secs {
        config.local.request_timeout_secs = secs;
    }

    // Hosted API
    if let Some(url) = toml.hosted.base_url {
        config.hosted.base_url = url;
    }
    if let Some(env) = toml.hosted.token_env {
        config.hosted.token_env = env;
    }
    if let Some(secs) = toml.hosted.request_timeout_secs {
        config.hosted.request_timeout_secs = secs;
    }

    // Provider
    if let Some(enabled) = toml.provider.enabled {
        config.provider.enabled = enabled;
    }
    if let Some(url) = toml.provider.base_url {
        config.provider.base_url = url;
    }
    if let Some(model) = toml.provider.model {
        config.provider.model = model;
    }
    if let Some(env) = toml.provider.api_key_env {
        config.provider.api_key_env = env;
    }
    if let Some(secs) = toml.provider.request_timeout_secs {
        config.provider.request_timeout_secs = secs;
    }

    // Validation
    if let Some(max) = toml.validation.max_text_chars {
        config.validation.max_text_chars = max;
    }
    if let Some(max) = toml.validation.max_context_chars {
        config.validation.max_context_chars = max;
    }

    if let Some(pairs) = toml.pairs {
        config.pairs = pairs;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut LinguaConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(size) = env("LINGUA_CACHE_MAX_SIZE").and_then(|v| v.parse::<usize>().ok()) {
        config.cache.max_size = size;
        config.source = ConfigSource::Env;
    }
    if let Some(ttl) = env("LINGUA_CACHE_TTL_SECS").and_then(|v| v.parse::<u64>().ok()) {
        config.cache.ttl_secs = ttl;
        config.source = ConfigSource::Env;
    }
    if let Some(pivot) = env("LINGUA_UNIVERSAL_PIVOT") {
        config.routing.universal_pivot = pivot;
        config.source = ConfigSource::Env;
    }

    if let Some(host) = env("OLLAMA_HOST") {
        // OLLAMA_HOST is commonly written as host:port
        match split_host_port(&host) {
            Some((host, port)) => {
                config.local.host = host.to_string();
                config.local.port = port;
            }
            None => config.local.host = host,
        }
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("OLLAMA_PORT").and_then(|v| v.parse::<u16>().ok()) {
        config.local.port = port;
        config.source = ConfigSource::Env;
    }
    if let Some(url) = env("LINGUA_HOSTED_URL") {
        config.hosted.base_url = url;
        config.source = ConfigSource::Env;
    }

    if let Some(flag) = env("USE_OPENAI") {
        config.provider.enabled = flag == "1" || flag.eq_ignore_ascii_case("true");
        config.source = ConfigSource::Env;
    }
    if let Some(model) = env("LINGUA_PROVIDER_MODEL") {
        config.provider.model = model;
        config.source = ConfigSource::Env;
    }
}

/// `"host:11434"` or `"http://host:11434"` into host and port
fn split_host_port(value: &str) -> Option<(&str, u16)> {
    let (host, port) = value.rsplit_once(':')?;
    let port = port.parse().ok()?;
    if host.is_empty() || matches!(host, "http" | "https") {
        return None;
    }
    Some((host, port))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = LinguaConfig::default();

        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.routing.universal_pivot, "en");
        assert_eq!(config.routing.remote_timeout_secs, 30);
        assert_eq!(config.routing.init_timeout_secs, Some(300));
        assert_eq!(config.pairs.len(), 20);
        assert!(!config.provider.enabled);
        assert_eq!(config.source(), ConfigSource::Default);
        tokio_test::assert_ok!(config.validate());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("lingua/config.toml"));
        }
    }

    // =========================================================================
    // File Loading
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[cache]
max_size = 50
ttl_secs = 60

[routing]
universal_pivot = "en"
common_pivots = ["fr"]
preload = ["en-de"]
init_timeout_secs = 0

[routing.confidence]
pivot = 0.5

[local]
host = "models.lan"
port = 9000

[provider]
enabled = true
model = "gpt-4o-mini"

[validation]
max_text_chars = 200

[[pairs]]
source = "en"
target = "de"
kind = "local"
backend = "opus-mt-en-de"

[[pairs]]
source = "de"
target = "en"
kind = "remote-api"
backend = "Helsinki-NLP/opus-mt-de-en"
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.cache.max_size, 50);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.lock_timeout_ms, 100);
        assert_eq!(config.routing.common_pivots, vec!["fr".to_string()]);
        assert_eq!(config.routing.init_timeout_secs, None);
        assert_eq!(config.routing.confidence.pivot, 0.5);
        assert_eq!(config.routing.confidence.local, 0.9);
        assert_eq!(config.local.base_url(), "http://models.lan:9000");
        assert!(config.provider.enabled);
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.validation.max_text_chars, 200);
        assert_eq!(config.pairs.len(), 2);
        assert_eq!(config.pairs[1].kind, BackendKind::RemoteApi);
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_parse_empty_toml() {
        let file = write_toml("");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.pairs.len(), 20);
        assert_eq!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/lingua.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();

        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.config_file_path, None);
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[cache\nmax_size = ");
        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_unknown_backend_kind_is_parse_error() {
        let file = write_toml(
            r#"
[[pairs]]
source = "en"
target = "de"
kind = "quantum"
backend = "x"
"#,
        );
        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    // =========================================================================
    // Environment Overrides
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml("[cache]\nmax_size = 50\n");
        let env = env_from(&[
            ("LINGUA_CACHE_MAX_SIZE", "75"),
            ("LINGUA_CACHE_TTL_SECS", "90"),
            ("OLLAMA_HOST", "gpu-box"),
            ("OLLAMA_PORT", "8080"),
            ("USE_OPENAI", "true"),
            ("LINGUA_PROVIDER_MODEL", "gpt-4o"),
            ("LINGUA_HOSTED_URL", "https://hosted.test"),
        ]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), env).unwrap();

        assert_eq!(config.cache.max_size, 75);
        assert_eq!(config.cache.ttl_secs, 90);
        assert_eq!(config.local.base_url(), "http://gpu-box:8080");
        assert!(config.provider.enabled);
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.hosted.base_url, "https://hosted.test");
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_values_ignored() {
        let env = env_from(&[("LINGUA_CACHE_MAX_SIZE", "lots"), ("OLLAMA_PORT", "99999")]);
        let config = load_config_with_env(None, env).unwrap();

        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.local.port, 11434);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_use_openai_flag_values() {
        for (value, enabled) in [("1", true), ("TRUE", true), ("0", false), ("no", false)] {
            let config = load_config_with_env(None, env_from(&[("USE_OPENAI", value)])).unwrap();
            assert_eq!(config.provider.enabled, enabled, "USE_OPENAI={value}");
        }
    }

    #[test]
    fn test_ollama_host_with_port() {
        let config =
            load_config_with_env(None, env_from(&[("OLLAMA_HOST", "10.0.0.5:11500")])).unwrap();
        assert_eq!(config.local.host, "10.0.0.5");
        assert_eq!(config.local.port, 11500);

        let config = load_config_with_env(
            None,
            env_from(&[("OLLAMA_HOST", "http://models.lan:11600")]),
        )
        .unwrap();
        assert_eq!(config.local.base_url(), "http://models.lan:11600");
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("localhost:11434"), Some(("localhost", 11434)));
        assert_eq!(split_host_port("https://m.test:443"), Some(("https://m.test", 443)));
        assert_eq!(split_host_port("localhost"), None);
        assert_eq!(split_host_port("http://localhost"), None);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn test_zero_cache_size_rejected() {
        let err =
            load_config_with_env(None, env_from(&[("LINGUA_CACHE_MAX_SIZE", "0")])).unwrap_err();
        assert!(err.to_string().contains("cache.max_size"));
    }

    #[test]
    fn test_pivot_confidence_must_be_lowest() {
        let file = write_toml("[routing.confidence]\npivot = 0.95\n");
        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_duplicate_pairs_rejected() {
        let mut config = LinguaConfig::default();
        config.pairs.push(PairConfig::new("en", "es", BackendKind::RemoteApi, "dup"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate descriptor for en-es"));
    }

    #[test]
    fn test_preload_must_reference_local_pairs() {
        let mut config = LinguaConfig::default();
        config.routing.preload = vec!["en-zh".to_string()];
        assert!(config.validate().unwrap_err().to_string().contains("en-zh"));

        config.routing.preload = vec!["english".to_string()];
        assert!(config.validate().is_err());

        config.routing.preload = vec!["en-de".to_string()];
        tokio_test::assert_ok!(config.validate());
    }

    #[test]
    fn test_zero_remote_timeouts_rejected() {
        let file = write_toml("[routing]\nremote_timeout_secs = 0\n");
        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(err.to_string().contains("routing.remote_timeout_secs"));

        let mut config = LinguaConfig::default();
        config.provider.request_timeout_secs = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("provider.request_timeout_secs"));

        let mut config = LinguaConfig::default();
        config.hosted.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_universal_pivot_rejected() {
        let err =
            load_config_with_env(None, env_from(&[("LINGUA_UNIVERSAL_PIVOT", " ")])).unwrap_err();
        assert!(err.to_string().contains("universal_pivot"));
    }

    // =========================================================================
    // Display / Serialization
    // =========================================================================

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Default.to_string(), "default");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
    }

    #[test]
    fn test_effective_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&LinguaConfig::default()).unwrap();
        assert!(rendered.contains("[cache]"));
        assert!(rendered.contains("[[pairs]]"));
        assert!(!rendered.contains("config_file_path"));

        // Rendered output parses back as a config file
        let parsed: LinguaToml = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.pairs.map(|p| p.len()), Some(20));
    }

    #[test]
    fn test_unbounded_init_timeout_survives_render_and_reload() {
        let mut config = LinguaConfig::default();
        config.routing.init_timeout_secs = None;
        let rendered = toml::to_string_pretty(&config).unwrap();

        let file = write_toml(&rendered);
        let reloaded = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert_eq!(reloaded.routing.init_timeout_secs, None);
    }
}
