//! Error types for the reconciliation loop.

use thiserror::Error;
use wiki_search::SearchError;
use wiki_storage::StorageError;

/// Errors that can end an entity type's reconciliation run
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Reading or marking records failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Pushing a batch to the search engine failed
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}
