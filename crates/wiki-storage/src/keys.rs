//! Key encoding for the index_state column family.
//!
//! Key format: `idx:{kind}:{id}`. Record bodies are keyed by their raw id,
//! so only the index state needs a composite key.

use wiki_types::EntityKind;

use crate::error::StorageError;

/// Key recording that a record has been pushed to the search engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStateKey {
    pub kind: EntityKind,
    pub id: String,
}

impl IndexStateKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("idx:{}:{}", self.kind.as_str(), self.id).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        let rest = s
            .strip_prefix("idx:")
            .ok_or_else(|| StorageError::Key(format!("Invalid index state key: {}", s)))?;
        let (kind, id) = rest
            .split_once(':')
            .ok_or_else(|| StorageError::Key(format!("Invalid index state key: {}", s)))?;
        let kind = EntityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == kind)
            .ok_or_else(|| StorageError::Key(format!("Unknown entity kind: {}", kind)))?;
        Ok(Self::new(kind, id))
    }
}
