//! services/oracle/src/error.rs
//!
//! Defines the primary error type for the oracle service.

use crate::config::ConfigError;
use literary_oracle_core::ModelError;

/// The primary error type for the `oracle` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A language model adapter could not be constructed.
    #[error("Model adapter error: {0}")]
    Model(#[from] ModelError),

    /// Represents a standard Input/Output error (e.g., reading the console).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
