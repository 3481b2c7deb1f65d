//! Content store for the wiki derived-state services.
//!
//! Provides:
//! - Repository traits consumed by the backlink pool and the reconciliation loop
//! - A RocksDB-backed [`Storage`] implementing both repositories
//! - Column family isolation per entity type, plus one for index state
//! - Records keyed by ULID so range reads are stable and time ordered

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;
pub mod repository;

pub use db::{EntityStats, Storage, StoredRecord};
pub use error::StorageError;
pub use keys::IndexStateKey;
pub use repository::{ArticleRepository, CommunityRepository};
