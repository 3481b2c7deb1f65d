//! Error types for backlink passes.

use thiserror::Error;
use wiki_storage::StorageError;

#[derive(Debug, Error)]
pub enum BacklinkError {
    /// Counting the corpus failed; the pass never started.
    #[error("Failed to count articles: {0}")]
    Count(#[source] StorageError),
}
