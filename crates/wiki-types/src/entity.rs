//! Entity kinds handled by the derived-state services.

use serde::{Deserialize, Serialize};

/// The four content collections.
///
/// `ALL` lists them in reconciliation order: posts need groups
/// resolved first and comments need posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Article,
    Group,
    Post,
    Comment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Article,
        EntityKind::Group,
        EntityKind::Post,
        EntityKind::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Article => "article",
            EntityKind::Group => "group",
            EntityKind::Post => "post",
            EntityKind::Comment => "comment",
        }
    }

    /// Plural label used in log lines and stats output.
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Article => "articles",
            EntityKind::Group => "groups",
            EntityKind::Post => "posts",
            EntityKind::Comment => "comments",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
