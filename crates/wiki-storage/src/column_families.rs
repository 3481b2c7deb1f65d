//! Column family definitions for RocksDB.
//!
//! One column family per content collection, keyed by record id:
//! - articles, groups, posts, comments: JSON record bodies
//! - index_state: presence of a key means the record is indexed
//!
//! The indexed flag lives apart from the record bodies so that marking a
//! record indexed never rewrites (and never clobbers) its content.

use rocksdb::{ColumnFamilyDescriptor, Options};
use wiki_types::EntityKind;

/// Column family name for articles
pub const CF_ARTICLES: &str = "articles";

/// Column family name for community groups
pub const CF_GROUPS: &str = "groups";

/// Column family name for posts
pub const CF_POSTS: &str = "posts";

/// Column family name for comments
pub const CF_COMMENTS: &str = "comments";

/// Column family name for per-record indexed flags
pub const CF_INDEX_STATE: &str = "index_state";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[
    CF_ARTICLES,
    CF_GROUPS,
    CF_POSTS,
    CF_COMMENTS,
    CF_INDEX_STATE,
];

/// Column family holding the bodies of the given entity kind.
pub fn cf_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Article => CF_ARTICLES,
        EntityKind::Group => CF_GROUPS,
        EntityKind::Post => CF_POSTS,
        EntityKind::Comment => CF_COMMENTS,
    }
}

/// Options for record bodies (text heavy, compressed)
fn content_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_ARTICLES, content_options()),
        ColumnFamilyDescriptor::new(CF_GROUPS, Options::default()),
        ColumnFamilyDescriptor::new(CF_POSTS, content_options()),
        ColumnFamilyDescriptor::new(CF_COMMENTS, content_options()),
        ColumnFamilyDescriptor::new(CF_INDEX_STATE, Options::default()),
    ]
}
