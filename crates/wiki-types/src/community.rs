//! Community records: groups, posts and comments.
//!
//! Posts belong to a group; comments belong to a post and optionally
//! reply to a parent comment. Search documents for posts and comments
//! carry their group's visibility, so both must be resolvable through
//! their containment chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visibility class of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupType {
    #[default]
    Public,
    Private,
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Public => "PUBLIC",
            GroupType::Private => "PRIVATE",
        }
    }
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GroupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(GroupType::Public),
            "PRIVATE" => Ok(GroupType::Private),
            other => Err(format!("unknown group type: {}", other)),
        }
    }
}

/// A community group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group_type: GroupType,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub members_count: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub indexed: bool,
}

impl Group {
    /// Create a new, not yet indexed group with a fresh id.
    pub fn new(name: impl Into<String>, slug: impl Into<String>, group_type: GroupType) -> Self {
        Self {
            id: crate::new_record_id(),
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            group_type,
            owner_id: String::new(),
            members_count: 0,
            created_at: Utc::now(),
            indexed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }
}

/// A post inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub group_id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub indexed: bool,
}

impl Post {
    /// Create a new, not yet indexed post in `group_id`.
    pub fn new(
        group_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::new_record_id(),
            group_id: group_id.into(),
            title: title.into(),
            content: content.into(),
            author_id: String::new(),
            created_at: Utc::now(),
            indexed: false,
        }
    }

    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = author_id.into();
        self
    }
}

/// A comment on a post, optionally replying to another comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub indexed: bool,
}

impl Comment {
    /// Create a new top-level comment on `post_id`.
    pub fn new(post_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: crate::new_record_id(),
            post_id: post_id.into(),
            parent_id: None,
            content: content.into(),
            author_id: String::new(),
            created_at: Utc::now(),
            indexed: false,
        }
    }

    /// Make this comment a reply to `parent_id`.
    pub fn reply_to(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = author_id.into();
        self
    }
}
