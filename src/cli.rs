//! Command-line argument parsing for QueryGate.

use clap::Parser;
use querygate::config::Config;
use std::path::PathBuf;

/// Ask a SQLite database questions in plain language.
#[derive(Parser, Debug)]
#[command(name = "querygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Question to answer once and exit; starts an interactive session when omitted
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Model name served by Ollama
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Ollama base URL
    #[arg(long, value_name = "URL")]
    pub ollama_url: Option<String>,

    /// Model request timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Model provider (ollama or mock)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Config file path
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to a file instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Overrides configuration values with the flags that were given.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(db) = &self.db {
            config.store.path = db.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(url) = &self.ollama_url {
            config.llm.base_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.llm.timeout_secs = timeout;
        }
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
    }
}
