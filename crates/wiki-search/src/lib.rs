//! # wiki-search
//!
//! Search engine clients for the reconciliation loop.
//!
//! Two backends implement [`SearchEngine`]:
//! - [`TantivyEngine`]: embedded BM25 indexes, one directory per collection
//! - [`MeiliClient`]: Meilisearch over HTTP with retry and backoff
//!
//! Documents are built from content records with the functions in
//! [`document`]; articles go to the `articles` collection, everything else
//! to `community`.

pub mod document;
pub mod embedded;
pub mod engine;
pub mod error;
pub mod meili;
pub mod schema;

pub use document::{
    article_document, comment_document, group_document, post_document, ArticleDocument,
    Collection, CommentDocument, GroupDocument, IndexDocument, PostDocument,
};
pub use embedded::{SearchHit, SearchOptions, TantivyConfig, TantivyEngine};
pub use engine::SearchEngine;
pub use error::SearchError;
pub use meili::{MeiliClient, MeiliConfig};
