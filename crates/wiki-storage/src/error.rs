//! Storage layer error types.

use thiserror::Error;

/// Errors that can occur in the content store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// A column family expected by this schema version is missing
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Malformed record id or index state key
    #[error("Key error: {0}")]
    Key(String),

    /// Record body could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
