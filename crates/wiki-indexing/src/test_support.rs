//! In-memory repositories and search engine for loop tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use wiki_search::{Collection, IndexDocument, SearchEngine, SearchError};
use wiki_storage::{ArticleRepository, CommunityRepository, StorageError, StoredRecord};
use wiki_types::{Article, Comment, EntityKind, Group, Post};

#[derive(Default)]
pub struct MemoryStore {
    articles: Mutex<Vec<Article>>,
    groups: Mutex<Vec<Group>>,
    posts: Mutex<Vec<Post>>,
    comments: Mutex<Vec<Comment>>,
    fetch_calls: Mutex<HashMap<EntityKind, usize>>,
    failing_fetch: Option<EntityKind>,
    failing_mark: HashSet<String>,
    failing_group_lookup: bool,
}

fn sorted<R: StoredRecord>(mut records: Vec<R>) -> Vec<R> {
    records.sort_by(|a, b| a.id().cmp(b.id()));
    records
}

fn unindexed<R: StoredRecord + Clone>(records: &[R], after: Option<&str>, limit: usize) -> Vec<R> {
    records
        .iter()
        .filter(|r| !r.indexed() && after.map_or(true, |cursor| r.id() > cursor))
        .take(limit)
        .cloned()
        .collect()
}

fn mark<R: StoredRecord>(records: &mut [R], id: &str) -> Result<(), StorageError> {
    let record = records
        .iter_mut()
        .find(|r| r.id() == id)
        .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
    record.set_indexed(true);
    Ok(())
}

impl MemoryStore {
    pub fn with_articles(self, articles: Vec<Article>) -> Self {
        *self.articles.lock().unwrap() = sorted(articles);
        self
    }

    pub fn with_groups(self, groups: Vec<Group>) -> Self {
        *self.groups.lock().unwrap() = sorted(groups);
        self
    }

    pub fn with_posts(self, posts: Vec<Post>) -> Self {
        *self.posts.lock().unwrap() = sorted(posts);
        self
    }

    pub fn with_comments(self, comments: Vec<Comment>) -> Self {
        *self.comments.lock().unwrap() = sorted(comments);
        self
    }

    pub fn failing_fetch(mut self, kind: EntityKind) -> Self {
        self.failing_fetch = Some(kind);
        self
    }

    pub fn failing_mark(mut self, id: &str) -> Self {
        self.failing_mark.insert(id.to_string());
        self
    }

    pub fn failing_group_lookup(mut self) -> Self {
        self.failing_group_lookup = true;
        self
    }

    pub fn fetch_calls(&self, kind: EntityKind) -> usize {
        self.fetch_calls
            .lock()
            .unwrap()
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    pub fn unindexed_count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Article => unindexed(&self.articles.lock().unwrap(), None, usize::MAX).len(),
            EntityKind::Group => unindexed(&self.groups.lock().unwrap(), None, usize::MAX).len(),
            EntityKind::Post => unindexed(&self.posts.lock().unwrap(), None, usize::MAX).len(),
            EntityKind::Comment => unindexed(&self.comments.lock().unwrap(), None, usize::MAX).len(),
        }
    }

    fn before_fetch(&self, kind: EntityKind) -> Result<(), StorageError> {
        *self.fetch_calls.lock().unwrap().entry(kind).or_default() += 1;
        if self.failing_fetch == Some(kind) {
            return Err(StorageError::Serialization("fetch failed".into()));
        }
        Ok(())
    }

    fn before_mark(&self, id: &str) -> Result<(), StorageError> {
        if self.failing_mark.contains(id) {
            return Err(StorageError::Serialization("mark failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ArticleRepository for MemoryStore {
    async fn count_articles(&self) -> Result<u64, StorageError> {
        Ok(self.articles.lock().unwrap().len() as u64)
    }

    async fn articles_range(&self, offset: u64, limit: u64) -> Result<Vec<Article>, StorageError> {
        Ok(self
            .articles
            .lock()
            .unwrap()
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_article_content(&self, id: &str, content: &str) -> Result<(), StorageError> {
        let mut articles = self.articles.lock().unwrap();
        let article = articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        article.content = content.to_string();
        Ok(())
    }

    async fn unindexed_articles(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Article>, StorageError> {
        self.before_fetch(EntityKind::Article)?;
        Ok(unindexed(&self.articles.lock().unwrap(), after, limit))
    }

    async fn mark_article_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.before_mark(id)?;
        mark(&mut self.articles.lock().unwrap(), id)
    }
}

#[async_trait]
impl CommunityRepository for MemoryStore {
    async fn unindexed_groups(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Group>, StorageError> {
        self.before_fetch(EntityKind::Group)?;
        Ok(unindexed(&self.groups.lock().unwrap(), after, limit))
    }

    async fn unindexed_posts(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Post>, StorageError> {
        self.before_fetch(EntityKind::Post)?;
        Ok(unindexed(&self.posts.lock().unwrap(), after, limit))
    }

    async fn unindexed_comments(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Comment>, StorageError> {
        self.before_fetch(EntityKind::Comment)?;
        Ok(unindexed(&self.comments.lock().unwrap(), after, limit))
    }

    async fn mark_group_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.before_mark(id)?;
        mark(&mut self.groups.lock().unwrap(), id)
    }

    async fn mark_post_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.before_mark(id)?;
        mark(&mut self.posts.lock().unwrap(), id)
    }

    async fn mark_comment_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.before_mark(id)?;
        mark(&mut self.comments.lock().unwrap(), id)
    }

    async fn groups_by_ids(&self, ids: &[String]) -> Result<Vec<Group>, StorageError> {
        if self.failing_group_lookup {
            return Err(StorageError::Serialization("lookup failed".into()));
        }
        Ok(self
            .groups
            .lock()
            .unwrap()
            .iter()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect())
    }

    async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>, StorageError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryEngine {
    docs: Mutex<HashMap<Collection, BTreeMap<String, IndexDocument>>>,
    batches: Mutex<Vec<usize>>,
    failing: Option<Collection>,
}

impl MemoryEngine {
    pub fn failing_for(mut self, collection: Collection) -> Self {
        self.failing = Some(collection);
        self
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.docs
            .lock()
            .unwrap()
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn get(&self, collection: Collection, id: &str) -> Option<IndexDocument> {
        self.docs
            .lock()
            .unwrap()
            .get(&collection)
            .and_then(|docs| docs.get(id).cloned())
    }
}

#[async_trait]
impl SearchEngine for MemoryEngine {
    async fn ensure_collections(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn index_batch(
        &self,
        collection: Collection,
        docs: &[IndexDocument],
    ) -> Result<(), SearchError> {
        if self.failing == Some(collection) {
            return Err(SearchError::Api {
                status: 503,
                body: "unavailable".into(),
            });
        }
        self.batches.lock().unwrap().push(docs.len());
        let mut all = self.docs.lock().unwrap();
        let stored = all.entry(collection).or_default();
        for doc in docs {
            stored.insert(doc.id().to_string(), doc.clone());
        }
        Ok(())
    }
}
