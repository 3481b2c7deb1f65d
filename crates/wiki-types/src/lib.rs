//! # wiki-types
//!
//! Shared domain types for the wiki derived-state services.
//!
//! This crate defines the content records every other crate works with:
//! - Articles: wiki pages that receive backlinks and are mirrored into search
//! - Groups, posts and comments: community content mirrored into search
//! - Entity kinds: the four record collections, in reconciliation order
//! - Settings: layered configuration for the `wiki-sync` binary
//!
//! ## Usage
//!
//! ```rust
//! use wiki_types::Article;
//!
//! let article = Article::new("Go", "go-lang", "Go is a language.");
//! assert!(!article.indexed);
//! ```

pub mod article;
pub mod community;
pub mod config;
pub mod entity;
pub mod error;

pub use article::Article;
pub use community::{Comment, Group, GroupType, Post};
pub use config::{BacklinkSettings, ReconcileSettings, SearchBackend, SearchSettings, Settings};
pub use entity::EntityKind;
pub use error::WikiError;

/// Generate a new time-ordered record id.
///
/// ULIDs sort lexicographically by creation time, which gives the store a
/// stable, monotonically ordered view for chunked reads.
pub fn new_record_id() -> String {
    ulid::Ulid::new().to_string()
}
