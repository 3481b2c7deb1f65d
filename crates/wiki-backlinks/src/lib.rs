//! # wiki-backlinks
//!
//! Links a newly created article's title into the bodies of existing
//! articles.
//!
//! - [`matcher`]: whole-word, case-insensitive title matching and Markdown
//!   link rewriting
//! - [`partition`]: splitting the corpus into per-worker ranges
//! - [`pool`]: one pass, N concurrent workers
//! - [`trigger`]: fire-and-forget passes tracked for shutdown

pub mod error;
pub mod matcher;
pub mod partition;
pub mod pool;
pub mod trigger;

#[cfg(test)]
mod test_support;

pub use error::BacklinkError;
pub use matcher::{link_title, TitleMatcher};
pub use partition::{partition, Partition};
pub use pool::{BacklinkJob, BacklinkPool, PassSummary};
pub use trigger::{BacklinkHandle, BacklinkTrigger};
