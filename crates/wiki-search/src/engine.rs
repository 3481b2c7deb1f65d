//! Search engine abstraction used by the reconciliation loop.

use async_trait::async_trait;

use crate::document::{Collection, IndexDocument};
use crate::error::SearchError;

/// A search backend with create-or-replace semantics keyed by document id.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Create the collections if they do not exist yet.
    async fn ensure_collections(&self) -> Result<(), SearchError>;

    /// Push one batch of documents to a collection.
    ///
    /// A document whose id already exists replaces the stored one. An `Err`
    /// means none of the batch can be assumed stored.
    async fn index_batch(
        &self,
        collection: Collection,
        docs: &[IndexDocument],
    ) -> Result<(), SearchError>;
}
