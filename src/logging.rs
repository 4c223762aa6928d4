//! Logging configuration for QueryGate.
//!
//! Interactive sessions can send logs to a file so they do not interleave
//! with results on the terminal; one-shot runs log to stderr.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, defaulting to `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to the file at [`log_path`], truncated on each run.
///
/// Returns the path written to, or `None` if the file could not be created,
/// in which case logging stays disabled.
pub fn init_file_logging() -> Option<PathBuf> {
    let path = log_path();

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return None;
        }
    }

    let file = match File::create(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {}: {e}", path.display());
            return None;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(file)
        .with_ansi(false)
        .init();

    Some(path)
}

/// Returns the log file location.
///
/// `querygate/querygate.log` under the platform state directory, then the
/// config directory, then the temp directory.
pub fn log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("querygate").join("querygate.log"))
        .unwrap_or_else(|| std::env::temp_dir().join("querygate.log"))
}
