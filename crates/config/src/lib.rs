//! Configuration loading, validation, and management for Mini-Jira.
//!
//! Loads configuration from `~/.minijira/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.minijira/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for hosted OpenAI-compatible endpoints (Ollama needs none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM provider name
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model used for intent classification
    #[serde(default = "default_model")]
    pub model: String,

    /// Endpoint override; `None` means the provider's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sampling temperature for the classifier call
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per classifier reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on one model round trip
    #[serde(default = "default_classifier_timeout")]
    pub classifier_timeout_secs: u64,

    /// Conversation history bounds
    #[serde(default)]
    pub history: HistoryConfig,

    /// Domain database
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama3".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    512
}
fn default_classifier_timeout() -> u64 {
    60
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("classifier_timeout_secs", &self.classifier_timeout_secs)
            .field("history", &self.history)
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Max messages carried into a turn
    #[serde(default = "default_max_window")]
    pub max_window: usize,

    /// Max cumulative characters carried into a turn
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_window() -> usize {
    12
}
fn default_max_chars() -> usize {
    6000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_window: default_max_window(),
            max_chars: default_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    AppConfig::config_dir().join("database.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Browser origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    ["localhost", "127.0.0.1"]
        .iter()
        .flat_map(|host| [5173, 5174].map(|port| format!("http://{host}:{port}")))
        .collect()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.minijira/config.toml)
    /// and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides, reading variables through `lookup`.
    ///
    /// Precedence, highest first:
    /// - `MINIJIRA_API_KEY`, `OPENAI_API_KEY` (only when the file set none)
    /// - `MINIJIRA_PROVIDER`
    /// - `MINIJIRA_MODEL`, `MODEL_NAME`
    /// - `MINIJIRA_BASE_URL`, `OLLAMA_BASE_URL`
    /// - `MINIJIRA_DB`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(k))
                .find(|v| !v.trim().is_empty())
        };

        if self.api_key.is_none() {
            self.api_key = first(&["MINIJIRA_API_KEY", "OPENAI_API_KEY"]);
        }
        if let Some(provider) = first(&["MINIJIRA_PROVIDER"]) {
            self.provider = provider;
        }
        if let Some(model) = first(&["MINIJIRA_MODEL", "MODEL_NAME"]) {
            self.model = model;
        }
        if let Some(url) = first(&["MINIJIRA_BASE_URL"]) {
            self.base_url = Some(url);
        } else if let Some(host) = first(&["OLLAMA_BASE_URL"]) {
            self.base_url = Some(ollama_api_url(&host));
        }
        if let Some(db) = first(&["MINIJIRA_DB"]) {
            self.store.path = PathBuf::from(db);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".minijira")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.classifier_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "classifier_timeout_secs must be > 0".into(),
            ));
        }

        if self.history.max_window == 0 {
            return Err(ConfigError::ValidationError(
                "history.max_window must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            classifier_timeout_secs: default_classifier_timeout(),
            history: HistoryConfig::default(),
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Ollama's native host URL to its OpenAI-compatible endpoint.
fn ollama_api_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.ends_with("/v1") {
        host.to_string()
    } else {
        format!("{host}/v1")
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.history.max_window, 12);
        assert_eq!(config.history.max_chars, 6000);
        assert!(config.store.path.ends_with(".minijira/database.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_origins_cover_both_dev_ports() {
        let origins = GatewayConfig::default().allowed_origins;
        assert_eq!(origins.len(), 4);
        assert!(origins.contains(&"http://localhost:5173".to_string()));
        assert!(origins.contains(&"http://127.0.0.1:5174".to_string()));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.store.path, config.store.path);
    }

    #[test]
    fn invalid_values_rejected() {
        let hot = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(hot.validate().is_err());

        let no_timeout = AppConfig {
            classifier_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(no_timeout.validate().is_err());

        let mut no_window = AppConfig::default();
        no_window.history.max_window = 0;
        assert!(no_window.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider, "ollama");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "model = \"qwen2.5\"\n\n[history]\nmax_window = 4\n\n[store]\npath = \"/tmp/t.db\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "qwen2.5");
        assert_eq!(config.history.max_window, 4);
        assert_eq!(config.history.max_chars, 6000);
        assert_eq!(config.store.path, PathBuf::from("/tmp/t.db"));
        assert_eq!(config.gateway.host, "127.0.0.1");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "temperature = \"warm\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply_in_precedence_order() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("OPENAI_API_KEY", "sk-openai"),
            ("MINIJIRA_API_KEY", "sk-mini"),
            ("MODEL_NAME", "mistral"),
            ("MINIJIRA_PROVIDER", "openai"),
            ("MINIJIRA_DB", "/var/lib/minijira.db"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-mini"));
        assert_eq!(config.model, "mistral");
        assert_eq!(config.provider, "openai");
        assert_eq!(config.store.path, PathBuf::from("/var/lib/minijira.db"));
    }

    #[test]
    fn file_api_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(env(&[("OPENAI_API_KEY", "from-env")]));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn ollama_host_gets_api_suffix() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("OLLAMA_BASE_URL", "http://gpu-box:11434/")]));
        assert_eq!(config.base_url.as_deref(), Some("http://gpu-box:11434/v1"));

        let mut explicit = AppConfig::default();
        explicit.apply_env(env(&[
            ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
            ("MINIJIRA_BASE_URL", "http://proxy/v1"),
        ]));
        assert_eq!(explicit.base_url.as_deref(), Some("http://proxy/v1"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("MINIJIRA_MODEL", "  ")]));
        assert_eq!(config.model, "llama3");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml = AppConfig::default_toml();
        assert!(toml.contains("provider = \"ollama\""));
        assert!(toml.contains("[history]"));
        assert!(toml.contains("[gateway]"));
    }
}
