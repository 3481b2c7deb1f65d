//! RocksDB wrapper for the wiki content store.
//!
//! Provides:
//! - Database open with column family setup
//! - Generic record put/get keyed by id
//! - Offset ranges and keyset scans in id order
//! - Indexed flags kept in their own column family

use std::path::Path;

use async_trait::async_trait;
use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use wiki_types::{Article, Comment, EntityKind, Group, Post};

use crate::column_families::{build_cf_descriptors, cf_for, CF_INDEX_STATE};
use crate::error::StorageError;
use crate::keys::IndexStateKey;
use crate::repository::{ArticleRepository, CommunityRepository};

/// A record that lives in one of the content column families.
pub trait StoredRecord: Serialize + DeserializeOwned + Send {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn indexed(&self) -> bool;

    fn set_indexed(&mut self, indexed: bool);
}

macro_rules! impl_stored_record {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(impl StoredRecord for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn indexed(&self) -> bool {
                self.indexed
            }

            fn set_indexed(&mut self, indexed: bool) {
                self.indexed = indexed;
            }
        })*
    };
}

impl_stored_record!(
    Article => EntityKind::Article,
    Group => EntityKind::Group,
    Post => EntityKind::Post,
    Comment => EntityKind::Comment,
);

/// Main storage interface for wiki content
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    fn is_indexed(&self, kind: EntityKind, id: &str) -> Result<bool, StorageError> {
        let state_cf = self.cf(CF_INDEX_STATE)?;
        let key = IndexStateKey::new(kind, id);
        Ok(self.db.get_cf(&state_cf, key.to_bytes())?.is_some())
    }

    fn decode<R: StoredRecord>(&self, bytes: &[u8]) -> Result<R, StorageError> {
        let mut record: R = serde_json::from_slice(bytes)?;
        let indexed = self.is_indexed(R::KIND, record.id())?;
        record.set_indexed(indexed);
        Ok(record)
    }

    /// Insert or replace a record.
    ///
    /// The record's `indexed` field decides whether its index state key is
    /// written or removed, in the same batch as the body.
    pub fn put<R: StoredRecord>(&self, record: &R) -> Result<(), StorageError> {
        let body_cf = self.cf(cf_for(R::KIND))?;
        let state_cf = self.cf(CF_INDEX_STATE)?;

        let bytes = serde_json::to_vec(record)?;
        let state_key = IndexStateKey::new(R::KIND, record.id());

        let mut batch = WriteBatch::default();
        batch.put_cf(&body_cf, record.id().as_bytes(), &bytes);
        if record.indexed() {
            batch.put_cf(&state_cf, state_key.to_bytes(), b"");
        } else {
            batch.delete_cf(&state_cf, state_key.to_bytes());
        }
        self.db.write(batch)?;

        debug!(kind = %R::KIND, id = record.id(), "Stored record");
        Ok(())
    }

    /// Get a record by id
    pub fn get<R: StoredRecord>(&self, id: &str) -> Result<Option<R>, StorageError> {
        let body_cf = self.cf(cf_for(R::KIND))?;
        match self.db.get_cf(&body_cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(self.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_article(&self, article: &Article) -> Result<(), StorageError> {
        self.put(article)
    }

    pub fn put_group(&self, group: &Group) -> Result<(), StorageError> {
        self.put(group)
    }

    pub fn put_post(&self, post: &Post) -> Result<(), StorageError> {
        self.put(post)
    }

    pub fn put_comment(&self, comment: &Comment) -> Result<(), StorageError> {
        self.put(comment)
    }

    pub fn get_article(&self, id: &str) -> Result<Option<Article>, StorageError> {
        self.get(id)
    }

    pub fn get_group(&self, id: &str) -> Result<Option<Group>, StorageError> {
        self.get(id)
    }

    pub fn get_post(&self, id: &str) -> Result<Option<Post>, StorageError> {
        self.get(id)
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<Comment>, StorageError> {
        self.get(id)
    }

    /// Get every record whose id is in `ids`, skipping ids that do not exist.
    pub fn get_many<R: StoredRecord>(&self, ids: &[String]) -> Result<Vec<R>, StorageError> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Number of records of one kind
    pub fn count<R: StoredRecord>(&self) -> Result<u64, StorageError> {
        let body_cf = self.cf(cf_for(R::KIND))?;
        self.count_cf_entries(body_cf)
    }

    /// Records at positions `[offset, offset + limit)` in id order.
    pub fn range<R: StoredRecord>(&self, offset: u64, limit: u64) -> Result<Vec<R>, StorageError> {
        let body_cf = self.cf(cf_for(R::KIND))?;
        let mut records = Vec::new();

        let iter = self.db.iterator_cf(&body_cf, IteratorMode::Start);
        for item in iter.skip(offset as usize).take(limit as usize) {
            let (_, value) = item?;
            records.push(self.decode(&value)?);
        }

        Ok(records)
    }

    /// Up to `limit` unindexed records with id strictly greater than `after`.
    ///
    /// Scans forward in id order from the cursor, skipping indexed records.
    pub fn unindexed<R: StoredRecord>(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<R>, StorageError> {
        let body_cf = self.cf(cf_for(R::KIND))?;
        let mut records = Vec::new();
        if limit == 0 {
            return Ok(records);
        }

        let mode = match after {
            Some(cursor) => IteratorMode::From(cursor.as_bytes(), Direction::Forward),
            None => IteratorMode::Start,
        };

        for item in self.db.iterator_cf(&body_cf, mode) {
            let (key, value) = item?;
            if after.is_some_and(|cursor| &*key == cursor.as_bytes()) {
                continue;
            }
            let id = std::str::from_utf8(&key)
                .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
            if self.is_indexed(R::KIND, id)? {
                continue;
            }

            let mut record: R = serde_json::from_slice(&value)?;
            record.set_indexed(false);
            records.push(record);
            if records.len() >= limit {
                break;
            }
        }

        Ok(records)
    }

    /// Set the indexed flag of an existing record.
    pub fn set_indexed(&self, kind: EntityKind, id: &str) -> Result<(), StorageError> {
        let body_cf = self.cf(cf_for(kind))?;
        if self.db.get_cf(&body_cf, id.as_bytes())?.is_none() {
            return Err(StorageError::NotFound(format!("{} {}", kind, id)));
        }

        let state_cf = self.cf(CF_INDEX_STATE)?;
        self.db
            .put_cf(&state_cf, IndexStateKey::new(kind, id).to_bytes(), b"")?;
        Ok(())
    }

    /// Clear the indexed flag of every record of one kind.
    ///
    /// Returns the number of flags cleared. The next reconciliation run
    /// pushes all of them again.
    pub fn reset_indexed(&self, kind: EntityKind) -> Result<usize, StorageError> {
        let state_cf = self.cf(CF_INDEX_STATE)?;
        let prefix = format!("idx:{}:", kind.as_str()).into_bytes();

        let mut batch = WriteBatch::default();
        let mut cleared = 0;
        let iter = self
            .db
            .iterator_cf(&state_cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            batch.delete_cf(&state_cf, &key);
            cleared += 1;
        }

        self.db.write(batch)?;
        info!(kind = %kind, cleared, "Reset indexed flags");
        Ok(cleared)
    }

    /// Replace the content of one article, leaving its index state alone.
    pub fn update_article_content(&self, id: &str, content: &str) -> Result<(), StorageError> {
        let body_cf = self.cf(cf_for(EntityKind::Article))?;
        let bytes = self
            .db
            .get_cf(&body_cf, id.as_bytes())?
            .ok_or_else(|| StorageError::NotFound(format!("article {}", id)))?;

        let mut article: Article = serde_json::from_slice(&bytes)?;
        article.content = content.to_string();
        self.db
            .put_cf(&body_cf, id.as_bytes(), serde_json::to_vec(&article)?)?;

        debug!(id, "Updated article content");
        Ok(())
    }

    /// Flush all memtables to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        for kind in EntityKind::ALL {
            self.db.flush_cf(self.cf(cf_for(kind))?)?;
        }
        self.db.flush_cf(self.cf(CF_INDEX_STATE)?)?;
        Ok(())
    }

    /// Per-kind record and indexed counts
    pub fn stats(&self) -> Result<Vec<EntityStats>, StorageError> {
        let state_cf = self.cf(CF_INDEX_STATE)?;
        let mut stats = Vec::with_capacity(EntityKind::ALL.len());

        for kind in EntityKind::ALL {
            let total = self.count_cf_entries(self.cf(cf_for(kind))?)?;

            let prefix = format!("idx:{}:", kind.as_str()).into_bytes();
            let mut indexed = 0;
            let iter = self
                .db
                .iterator_cf(&state_cf, IteratorMode::From(&prefix, Direction::Forward));
            for item in iter {
                let (key, _) = item?;
                if !key.starts_with(&prefix) {
                    break;
                }
                indexed += 1;
            }

            stats.push(EntityStats {
                kind,
                total,
                indexed,
            });
        }

        Ok(stats)
    }

    fn count_cf_entries(&self, cf: &ColumnFamily) -> Result<u64, StorageError> {
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

/// Record counts for one entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityStats {
    pub kind: EntityKind,
    pub total: u64,
    pub indexed: u64,
}

impl EntityStats {
    pub fn pending(&self) -> u64 {
        self.total.saturating_sub(self.indexed)
    }
}

#[async_trait]
impl ArticleRepository for Storage {
    async fn count_articles(&self) -> Result<u64, StorageError> {
        self.count::<Article>()
    }

    async fn articles_range(&self, offset: u64, limit: u64) -> Result<Vec<Article>, StorageError> {
        self.range(offset, limit)
    }

    async fn update_article_content(&self, id: &str, content: &str) -> Result<(), StorageError> {
        Storage::update_article_content(self, id, content)
    }

    async fn unindexed_articles(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Article>, StorageError> {
        self.unindexed(after, limit)
    }

    async fn mark_article_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.set_indexed(EntityKind::Article, id)
    }
}

#[async_trait]
impl CommunityRepository for Storage {
    async fn unindexed_groups(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Group>, StorageError> {
        self.unindexed(after, limit)
    }

    async fn unindexed_posts(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Post>, StorageError> {
        self.unindexed(after, limit)
    }

    async fn unindexed_comments(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Comment>, StorageError> {
        self.unindexed(after, limit)
    }

    async fn mark_group_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.set_indexed(EntityKind::Group, id)
    }

    async fn mark_post_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.set_indexed(EntityKind::Post, id)
    }

    async fn mark_comment_indexed(&self, id: &str) -> Result<(), StorageError> {
        self.set_indexed(EntityKind::Comment, id)
    }

    async fn groups_by_ids(&self, ids: &[String]) -> Result<Vec<Group>, StorageError> {
        self.get_many(ids)
    }

    async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>, StorageError> {
        self.get_many(ids)
    }
}
