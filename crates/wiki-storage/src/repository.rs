//! Repository traits required by the derived-state services.
//!
//! The backlink pool only needs [`ArticleRepository`]; the reconciliation
//! loop needs both. Implementations must be safe to share across tasks and
//! give a stable id order across repeated range reads within one pass.

use async_trait::async_trait;

use wiki_types::{Article, Comment, Group, Post};

use crate::error::StorageError;

/// Article access used by backlink passes and article reconciliation.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Total number of articles.
    async fn count_articles(&self) -> Result<u64, StorageError>;

    /// Articles at positions `[offset, offset + limit)` in id order.
    async fn articles_range(&self, offset: u64, limit: u64) -> Result<Vec<Article>, StorageError>;

    /// Replace the body of one article. Does not touch its indexed flag.
    async fn update_article_content(&self, id: &str, content: &str) -> Result<(), StorageError>;

    /// Up to `limit` unindexed articles with id strictly greater than `after`.
    async fn unindexed_articles(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Article>, StorageError>;

    /// Set the indexed flag of one article.
    async fn mark_article_indexed(&self, id: &str) -> Result<(), StorageError>;
}

/// Group, post and comment access used by community reconciliation.
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    async fn unindexed_groups(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Group>, StorageError>;

    async fn unindexed_posts(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Post>, StorageError>;

    async fn unindexed_comments(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Comment>, StorageError>;

    async fn mark_group_indexed(&self, id: &str) -> Result<(), StorageError>;

    async fn mark_post_indexed(&self, id: &str) -> Result<(), StorageError>;

    async fn mark_comment_indexed(&self, id: &str) -> Result<(), StorageError>;

    /// Groups with the given ids. Missing ids are omitted from the result.
    async fn groups_by_ids(&self, ids: &[String]) -> Result<Vec<Group>, StorageError>;

    /// Posts with the given ids. Missing ids are omitted from the result.
    async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>, StorageError>;
}
