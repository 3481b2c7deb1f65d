//! Error types shared across the wiki services.

use thiserror::Error;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum WikiError {
    /// Settings could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),
}
