//! In-memory article repository with injectable failures.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use wiki_storage::{ArticleRepository, StorageError};
use wiki_types::Article;

pub struct MemoryArticles {
    articles: Mutex<Vec<Article>>,
    fail_count: bool,
    fail_range_at: Option<u64>,
    fail_write_for: HashSet<String>,
    writes: AtomicUsize,
}

impl MemoryArticles {
    pub fn new(mut articles: Vec<Article>) -> Self {
        articles.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            articles: Mutex::new(articles),
            fail_count: false,
            fail_range_at: None,
            fail_write_for: HashSet::new(),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    pub fn failing_range_at(mut self, offset: u64) -> Self {
        self.fail_range_at = Some(offset);
        self
    }

    pub fn failing_write_for(mut self, id: &str) -> Self {
        self.fail_write_for.insert(id.to_string());
        self
    }

    pub fn content(&self, id: &str) -> String {
        self.articles
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.content.clone())
            .unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleRepository for MemoryArticles {
    async fn count_articles(&self) -> Result<u64, StorageError> {
        if self.fail_count {
            return Err(StorageError::Serialization("count failed".into()));
        }
        Ok(self.articles.lock().unwrap().len() as u64)
    }

    async fn articles_range(&self, offset: u64, limit: u64) -> Result<Vec<Article>, StorageError> {
        if self.fail_range_at == Some(offset) {
            return Err(StorageError::Serialization("range failed".into()));
        }
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
        if self.fail_write_for.contains(id) {
            return Err(StorageError::Serialization("write failed".into()));
        }
        let mut articles = self.articles.lock().unwrap();
        let article = articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        article.content = content.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn unindexed_articles(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Article>, StorageError> {
        Ok(self
            .articles
            .lock()
            .unwrap()
            .iter()
            .filter(|a| !a.indexed && after.map_or(true, |cursor| a.id.as_str() > cursor))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_article_indexed(&self, id: &str) -> Result<(), StorageError> {
        let mut articles = self.articles.lock().unwrap();
        if let Some(article) = articles.iter_mut().find(|a| a.id == id) {
            article.indexed = true;
        }
        Ok(())
    }
}
