//! Configuration management for QueryGate.
//!
//! Handles loading configuration from TOML files and environment variables.
//! Precedence, highest first: CLI flags, environment, config file, defaults.

use crate::error::{QueryGateError, Result};
use crate::llm::ollama::{
    DEFAULT_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
};
use crate::llm::LlmProvider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Main configuration structure for QueryGate.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Inference backend configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Relational store configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Inference backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Provider: "ollama" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name (e.g., "codellama", "llama2").
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the inference service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on one model call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_provider() -> String {
    LlmProvider::default().as_str().to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// Parses the configured provider.
    pub fn provider(&self) -> Result<LlmProvider> {
        self.provider.parse().map_err(QueryGateError::config)
    }

    /// Returns the model call bound.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the pre-populated SQLite database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Upper bound on one statement's execution, in seconds.
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,

    /// Maximum rows returned from a single statement.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("database.db")
}

fn default_statement_timeout_secs() -> u64 {
    30
}

fn default_max_rows() -> usize {
    1000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            statement_timeout_secs: default_statement_timeout_secs(),
            max_rows: default_max_rows(),
        }
    }
}

impl StoreConfig {
    /// Creates a store config for the given database file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Returns the statement execution bound.
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("querygate")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| QueryGateError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            QueryGateError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies `OLLAMA_URL`, `OLLAMA_MODEL` and `QUERYGATE_DB` from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies environment overrides using the given lookup.
    pub fn apply_env_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("OLLAMA_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.model = model;
        }
        if let Some(path) = lookup("QUERYGATE_DB") {
            self.store.path = PathBuf::from(path);
        }
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        self.llm.provider()?;

        let url = Url::parse(&self.llm.base_url).map_err(|e| {
            QueryGateError::config(format!("Invalid base_url '{}': {e}", self.llm.base_url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(QueryGateError::config(format!(
                "Invalid scheme '{}' in base_url. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(QueryGateError::config(
                "llm.timeout_secs must be greater than zero",
            ));
        }
        if self.store.statement_timeout_secs == 0 {
            return Err(QueryGateError::config(
                "store.statement_timeout_secs must be greater than zero",
            ));
        }
        if self.store.max_rows == 0 {
            return Err(QueryGateError::config(
                "store.max_rows must be greater than zero",
            ));
        }

        Ok(())
    }
}
