//! Per-entity-type reconciliation passes.
//!
//! A pass knows how to fetch unindexed records of one type, turn them into
//! search documents, and mark them indexed. Community records resolve their
//! owning group (and, for comments, their post) while transforming; a
//! record whose references cannot be resolved is reported as unresolved
//! and left out of the batch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use wiki_search::{
    article_document, comment_document, group_document, post_document, Collection, IndexDocument,
};
use wiki_storage::{ArticleRepository, CommunityRepository, StorageError, StoredRecord};
use wiki_types::{Article, Comment, EntityKind, Group, Post};

/// Documents built from one fetched batch.
#[derive(Debug, Default)]
pub struct Transformed {
    pub documents: Vec<IndexDocument>,
    /// Ids of records left out because a reference did not resolve
    pub unresolved: Vec<String>,
}

/// Reconciliation steps for one entity type.
#[async_trait]
pub trait EntityPass: Send + Sync {
    type Record: StoredRecord + Sync;

    fn kind(&self) -> EntityKind;

    /// Collection the documents are pushed to
    fn collection(&self) -> Collection;

    /// Up to `limit` unindexed records with id greater than `after`.
    async fn fetch(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Self::Record>, StorageError>;

    async fn transform(&self, records: &[Self::Record]) -> Transformed;

    async fn mark_indexed(&self, id: &str) -> Result<(), StorageError>;
}

pub struct ArticlePass {
    repo: Arc<dyn ArticleRepository>,
}

impl ArticlePass {
    pub fn new(repo: Arc<dyn ArticleRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl EntityPass for ArticlePass {
    type Record = Article;

    fn kind(&self) -> EntityKind {
        EntityKind::Article
    }

    fn collection(&self) -> Collection {
        Collection::Articles
    }

    async fn fetch(&self, after: Option<&str>, limit: usize) -> Result<Vec<Article>, StorageError> {
        self.repo.unindexed_articles(after, limit).await
    }

    async fn transform(&self, records: &[Article]) -> Transformed {
        Transformed {
            documents: records.iter().map(article_document).collect(),
            unresolved: Vec::new(),
        }
    }

    async fn mark_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.repo.mark_article_indexed(id).await
    }
}

pub struct GroupPass {
    repo: Arc<dyn CommunityRepository>,
}

impl GroupPass {
    pub fn new(repo: Arc<dyn CommunityRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl EntityPass for GroupPass {
    type Record = Group;

    fn kind(&self) -> EntityKind {
        EntityKind::Group
    }

    fn collection(&self) -> Collection {
        Collection::Community
    }

    async fn fetch(&self, after: Option<&str>, limit: usize) -> Result<Vec<Group>, StorageError> {
        self.repo.unindexed_groups(after, limit).await
    }

    async fn transform(&self, records: &[Group]) -> Transformed {
        Transformed {
            documents: records.iter().map(group_document).collect(),
            unresolved: Vec::new(),
        }
    }

    async fn mark_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.repo.mark_group_indexed(id).await
    }
}

pub struct PostPass {
    repo: Arc<dyn CommunityRepository>,
}

impl PostPass {
    pub fn new(repo: Arc<dyn CommunityRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl EntityPass for PostPass {
    type Record = Post;

    fn kind(&self) -> EntityKind {
        EntityKind::Post
    }

    fn collection(&self) -> Collection {
        Collection::Community
    }

    async fn fetch(&self, after: Option<&str>, limit: usize) -> Result<Vec<Post>, StorageError> {
        self.repo.unindexed_posts(after, limit).await
    }

    async fn transform(&self, records: &[Post]) -> Transformed {
        let group_ids = unique(records.iter().map(|p| p.group_id.as_str()));
        let groups = match lookup_groups(self.repo.as_ref(), &group_ids).await {
            Some(groups) => groups,
            None => return all_unresolved(records),
        };

        let mut out = Transformed::default();
        for post in records {
            match groups.get(&post.group_id) {
                Some(group) => out.documents.push(post_document(post, group)),
                None => {
                    warn!(post_id = %post.id, group_id = %post.group_id, "Post group not found");
                    out.unresolved.push(post.id.clone());
                }
            }
        }
        out
    }

    async fn mark_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.repo.mark_post_indexed(id).await
    }
}

pub struct CommentPass {
    repo: Arc<dyn CommunityRepository>,
}

impl CommentPass {
    pub fn new(repo: Arc<dyn CommunityRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl EntityPass for CommentPass {
    type Record = Comment;

    fn kind(&self) -> EntityKind {
        EntityKind::Comment
    }

    fn collection(&self) -> Collection {
        Collection::Community
    }

    async fn fetch(&self, after: Option<&str>, limit: usize) -> Result<Vec<Comment>, StorageError> {
        self.repo.unindexed_comments(after, limit).await
    }

    async fn transform(&self, records: &[Comment]) -> Transformed {
        let post_ids = unique(records.iter().map(|c| c.post_id.as_str()));
        let posts: HashMap<String, Post> = match self.repo.posts_by_ids(&post_ids).await {
            Ok(posts) => posts.into_iter().map(|p| (p.id.clone(), p)).collect(),
            Err(e) => {
                warn!(error = %e, count = post_ids.len(), "Post lookup failed");
                return all_unresolved(records);
            }
        };

        let group_ids = unique(posts.values().map(|p| p.group_id.as_str()));
        let groups = match lookup_groups(self.repo.as_ref(), &group_ids).await {
            Some(groups) => groups,
            None => return all_unresolved(records),
        };

        let mut out = Transformed::default();
        for comment in records {
            let resolved = posts
                .get(&comment.post_id)
                .and_then(|post| groups.get(&post.group_id).map(|group| (post, group)));
            match resolved {
                Some((post, group)) => out
                    .documents
                    .push(comment_document(comment, post, group)),
                None => {
                    warn!(
                        comment_id = %comment.id,
                        post_id = %comment.post_id,
                        "Comment post or group not found"
                    );
                    out.unresolved.push(comment.id.clone());
                }
            }
        }
        out
    }

    async fn mark_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.repo.mark_comment_indexed(id).await
    }
}

fn unique<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut ids: Vec<String> = ids.map(str::to_string).collect();
    ids.sort();
    ids.dedup();
    ids
}

async fn lookup_groups(
    repo: &dyn CommunityRepository,
    ids: &[String],
) -> Option<HashMap<String, Group>> {
    if ids.is_empty() {
        return Some(HashMap::new());
    }
    match repo.groups_by_ids(ids).await {
        Ok(groups) => Some(groups.into_iter().map(|g| (g.id.clone(), g)).collect()),
        Err(e) => {
            warn!(error = %e, count = ids.len(), "Group lookup failed");
            None
        }
    }
}

fn all_unresolved<R: StoredRecord>(records: &[R]) -> Transformed {
    Transformed {
        documents: Vec::new(),
        unresolved: records.iter().map(|r| r.id().to_string()).collect(),
    }
}
