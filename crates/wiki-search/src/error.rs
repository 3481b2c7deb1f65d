//! Search error types.

use thiserror::Error;

/// Errors that can occur while talking to a search engine.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Query parse error
    #[error("Query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Index writer is poisoned or held elsewhere
    #[error("Index is locked: {0}")]
    IndexLocked(String),

    /// Document cannot be written (e.g. empty id)
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Blocking index task panicked or was cancelled
    #[error("Index task failed: {0}")]
    Task(String),

    /// Collection name not known to this engine
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Transport failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Search server answered with a non-success status
    #[error("Search API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Client construction failed
    #[error("Client configuration error: {0}")]
    Config(String),

    /// Document (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SearchError {
    /// Whether a retry might succeed.
    ///
    /// Transport errors, rate limiting and 5xx answers are transient;
    /// everything else will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Http(_) => true,
            SearchError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Http(err.to_string())
    }
}
