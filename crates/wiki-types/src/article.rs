//! Article record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A wiki article.
///
/// The `content` body is Markdown and is the field the backlink pass
/// rewrites. The `indexed` flag is owned by the reconciliation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier (ULID for records created by this system)
    pub id: String,

    /// Display title, matched verbatim in other articles
    pub title: String,

    /// URL slug, target of backlinks
    pub slug: String,

    /// Markdown body
    pub content: String,

    /// Category label
    #[serde(default)]
    pub category: String,

    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: String,

    /// Author user id
    #[serde(default)]
    pub author_id: String,

    /// Creation time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// Whether the record has been pushed to the search engine
    #[serde(default)]
    pub indexed: bool,
}

impl Article {
    /// Create a new, not yet indexed article with a fresh id.
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::new_record_id(),
            title: title.into(),
            slug: slug.into(),
            content: content.into(),
            category: String::new(),
            thumbnail: String::new(),
            author_id: String::new(),
            created_at: Utc::now(),
            indexed: false,
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = author_id.into();
        self
    }

    /// Set the thumbnail URL.
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = thumbnail.into();
        self
    }

    /// Override the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
