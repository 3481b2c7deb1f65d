//! # wiki-indexing
//!
//! Reconciliation of content records into the search engine.
//!
//! The loop sweeps each collection for records whose indexed flag is not
//! set, pushes them in fixed-size batches and marks what was pushed. It is
//! the only retry mechanism: anything not marked is tried again on the
//! next run.

pub mod error;
pub mod pass;
pub mod reconcile;

#[cfg(test)]
mod test_support;

pub use error::IndexingError;
pub use pass::{ArticlePass, CommentPass, EntityPass, GroupPass, PostPass, Transformed};
pub use reconcile::{ReconcileConfig, ReconcileReport, ReconcileSummary, ReconciliationLoop};
