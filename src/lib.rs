//! QueryGate - ask a SQLite database questions in plain language.
//!
//! Questions are turned into SQL by a local model, statements that could
//! change data are held for confirmation, and results come back as tables.
//! This library exposes the core modules for the binary and integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod safety;
