//! Embedded search engine backed by Tantivy.
//!
//! Each collection gets its own index directory under the engine root:
//! `<root>/articles` and `<root>/community`. Writers are wrapped in
//! `Arc<Mutex>` and every batch is committed before `index_batch` returns,
//! so a successful push is immediately searchable after a reader reload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info, warn};

use crate::document::{Collection, IndexDocument};
use crate::engine::SearchEngine;
use crate::error::SearchError;
use crate::schema::{build_schema, SearchSchema};

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Embedded engine configuration
#[derive(Debug, Clone)]
pub struct TantivyConfig {
    /// Directory holding one sub-directory per collection
    pub root: PathBuf,
    /// Memory budget for each writer in MB
    pub writer_memory_mb: usize,
}

impl TantivyConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }
}

/// A search result with relevance score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub doc_type: String,
    pub title: String,
    /// BM25 relevance score
    pub score: f32,
    /// The document exactly as it was pushed
    pub document: serde_json::Value,
}

/// Search filters, mirroring the community front end's filterable fields.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub doc_type: Option<String>,
    pub group_type: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            doc_type: None,
            group_type: None,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn with_group_type(mut self, group_type: impl Into<String>) -> Self {
        self.group_type = Some(group_type.into());
        self
    }
}

struct CollectionIndex {
    index: Index,
    schema: SearchSchema,
    writer: Arc<Mutex<IndexWriter>>,
    reader: IndexReader,
}

impl CollectionIndex {
    fn open_or_create(path: &Path, writer_memory_mb: usize) -> Result<Self, SearchError> {
        let index = if path.join("meta.json").exists() {
            debug!(path = ?path, "Opening existing index");
            Index::open_in_dir(path)?
        } else {
            info!(path = ?path, "Creating new index");
            std::fs::create_dir_all(path)?;
            Index::create_in_dir(path, build_schema().schema().clone())?
        };
        let schema = SearchSchema::from_schema(index.schema())?;

        let writer = index.writer(writer_memory_mb * 1024 * 1024)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;

        Ok(Self {
            index,
            schema,
            writer: Arc::new(Mutex::new(writer)),
            reader,
        })
    }
}

fn to_tantivy(schema: &SearchSchema, doc: &IndexDocument) -> Result<TantivyDocument, SearchError> {
    if doc.id().is_empty() {
        return Err(SearchError::InvalidDocument(format!(
            "{} document without id",
            doc.doc_type()
        )));
    }

    let mut out = TantivyDocument::default();
    out.add_text(schema.id, doc.id());
    out.add_text(schema.doc_type, doc.doc_type());
    if let Some((group_id, group_type)) = doc.group() {
        out.add_text(schema.group_id, group_id);
        out.add_text(schema.group_type, group_type);
    }
    out.add_text(schema.title, doc.title());
    out.add_text(schema.body, doc.body());
    out.add_i64(schema.created_at, doc.created_at());
    out.add_text(schema.source, serde_json::to_string(doc)?);
    Ok(out)
}

/// Upsert and commit one batch. A batch that fails while staging is rolled
/// back, so none of its operations reach a later commit.
fn write_batch(
    writer: &Mutex<IndexWriter>,
    schema: &SearchSchema,
    docs: &[IndexDocument],
) -> Result<u64, SearchError> {
    let mut writer = writer
        .lock()
        .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

    if let Err(e) = stage_batch(&writer, schema, docs) {
        if let Err(rollback_err) = writer.rollback() {
            warn!(error = %rollback_err, "Failed to roll back index writer");
        }
        return Err(e);
    }

    Ok(writer.commit()?)
}

fn stage_batch(
    writer: &IndexWriter,
    schema: &SearchSchema,
    docs: &[IndexDocument],
) -> Result<(), SearchError> {
    for doc in docs {
        let tantivy_doc = to_tantivy(schema, doc)?;
        writer.delete_term(Term::from_field_text(schema.id, doc.id()));
        writer.add_document(tantivy_doc)?;
    }
    Ok(())
}

/// Search engine storing both collections in local Tantivy indexes.
pub struct TantivyEngine {
    config: TantivyConfig,
    collections: HashMap<Collection, CollectionIndex>,
}

impl TantivyEngine {
    /// Open (or create) the index of every collection under the root.
    pub fn open(config: TantivyConfig) -> Result<Self, SearchError> {
        let mut collections = HashMap::new();
        for collection in Collection::ALL {
            let path = config.root.join(collection.as_str());
            collections.insert(
                collection,
                CollectionIndex::open_or_create(&path, config.writer_memory_mb)?,
            );
        }

        info!(root = ?config.root, "Opened embedded search engine");
        Ok(Self {
            config,
            collections,
        })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    fn collection(&self, collection: Collection) -> Result<&CollectionIndex, SearchError> {
        self.collections
            .get(&collection)
            .ok_or_else(|| SearchError::UnknownCollection(collection.to_string()))
    }

    /// Number of live documents in a collection, as of the last commit.
    pub fn doc_count(&self, collection: Collection) -> Result<u64, SearchError> {
        let index = self.collection(collection)?;
        index.reader.reload()?;
        Ok(index.reader.searcher().num_docs())
    }

    /// BM25 search over title and body.
    pub fn search(
        &self,
        collection: Collection,
        query_str: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if query_str.trim().is_empty() || options.limit == 0 {
            return Ok(Vec::new());
        }

        let index = self.collection(collection)?;
        index.reader.reload()?;
        let searcher = index.reader.searcher();

        let query_parser =
            QueryParser::for_index(&index.index, vec![index.schema.title, index.schema.body]);
        let text_query = query_parser.parse_query(query_str)?;

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(Occur::Must, text_query)];
        if let Some(doc_type) = &options.doc_type {
            let term = Term::from_field_text(index.schema.doc_type, doc_type);
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
            ));
        }
        if let Some(group_type) = &options.group_type {
            let term = Term::from_field_text(index.schema.group_type, group_type);
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
            ));
        }
        let query = BooleanQuery::new(clauses);

        let top_docs = searcher.search(&query, &TopDocs::with_limit(options.limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let text = |field| {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string()
            };

            let document = match doc.get_first(index.schema.source).and_then(|v| v.as_str()) {
                Some(source) => serde_json::from_str(source)?,
                None => serde_json::Value::Null,
            };

            hits.push(SearchHit {
                id: text(index.schema.id),
                doc_type: text(index.schema.doc_type),
                title: text(index.schema.title),
                score,
                document,
            });
        }

        debug!(
            collection = %collection,
            query = query_str,
            results = hits.len(),
            "Search complete"
        );
        Ok(hits)
    }
}

#[async_trait]
impl SearchEngine for TantivyEngine {
    async fn ensure_collections(&self) -> Result<(), SearchError> {
        for collection in Collection::ALL {
            self.collection(collection)?;
        }
        debug!(root = ?self.config.root, "Embedded collections ready");
        Ok(())
    }

    async fn index_batch(
        &self,
        collection: Collection,
        docs: &[IndexDocument],
    ) -> Result<(), SearchError> {
        if docs.is_empty() {
            return Ok(());
        }
        let index = self.collection(collection)?;
        let writer = index.writer.clone();
        let schema = index.schema.clone();
        let batch = docs.to_vec();

        // Commits fsync; keep them off the async workers.
        let opstamp = tokio::task::spawn_blocking(move || write_batch(&writer, &schema, &batch))
            .await
            .map_err(|e| SearchError::Task(e.to_string()))??;
        info!(
            collection = %collection,
            count = docs.len(),
            opstamp,
            "Committed document batch"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{article_document, group_document, post_document};
    use tempfile::TempDir;
    use wiki_types::{Article, Group, GroupType, Post};

    fn open_engine() -> (TantivyEngine, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let engine = TantivyEngine::open(TantivyConfig::new(temp_dir.path())).unwrap();
        (engine, temp_dir)
    }

    #[tokio::test]
    async fn test_index_and_search_articles() {
        let (engine, _temp) = open_engine();
        let docs = vec![
            article_document(&Article::new("Rust", "rust", "Ownership and borrowing")),
            article_document(&Article::new("Go", "go", "Goroutines and channels")),
        ];

        engine.index_batch(Collection::Articles, &docs).await.unwrap();

        assert_eq!(engine.doc_count(Collection::Articles).unwrap(), 2);
        assert_eq!(engine.doc_count(Collection::Community).unwrap(), 0);

        let hits = engine
            .search(Collection::Articles, "borrowing", SearchOptions::default())
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Rust");
        assert_eq!(hits[0].doc_type, "article");
        assert_eq!(hits[0].document["slug"], "rust");
    }

    #[tokio::test]
    async fn test_index_batch_replaces_by_id() {
        let (engine, _temp) = open_engine();
        let mut article = Article::new("Rust", "rust", "old body");
        engine
            .index_batch(Collection::Articles, &[article_document(&article)])
            .await
            .unwrap();

        article.content = "new body".to_string();
        engine
            .index_batch(Collection::Articles, &[article_document(&article)])
            .await
            .unwrap();

        assert_eq!(engine.doc_count(Collection::Articles).unwrap(), 1);
        let hits = engine
            .search(Collection::Articles, "new", SearchOptions::default())
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document["content"], "new body");
    }

    #[tokio::test]
    async fn test_community_filters() {
        let (engine, _temp) = open_engine();
        let public = Group::new("Rust users", "rust-users", GroupType::Public);
        let private = Group::new("Rust core", "rust-core", GroupType::Private);
        let post = Post::new(public.id.clone(), "Rust meetup", "Rust meetup on friday");

        let docs = vec![
            group_document(&public),
            group_document(&private),
            post_document(&post, &public),
        ];
        engine
            .index_batch(Collection::Community, &docs)
            .await
            .unwrap();

        let all = engine
            .search(Collection::Community, "rust", SearchOptions::default())
            .unwrap();
        assert_eq!(all.len(), 3);

        let posts = engine
            .search(
                Collection::Community,
                "rust",
                SearchOptions::default().with_doc_type("post"),
            )
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, post.id);

        let public_only = engine
            .search(
                Collection::Community,
                "rust",
                SearchOptions::default().with_group_type("PUBLIC"),
            )
            .unwrap();
        assert_eq!(public_only.len(), 2);
    }

    #[tokio::test]
    async fn test_reopen_keeps_documents() {
        let temp_dir = TempDir::new().unwrap();
        {
            let engine = TantivyEngine::open(TantivyConfig::new(temp_dir.path())).unwrap();
            engine
                .index_batch(
                    Collection::Articles,
                    &[article_document(&Article::new("Zig", "zig", "comptime"))],
                )
                .await
                .unwrap();
        }

        let engine = TantivyEngine::open(TantivyConfig::new(temp_dir.path())).unwrap();
        assert_eq!(engine.doc_count(Collection::Articles).unwrap(), 1);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let (engine, _temp) = open_engine();
        let hits = engine
            .search(Collection::Articles, "   ", SearchOptions::default())
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let (engine, _temp) = open_engine();
        let hits = engine
            .search(
                Collection::Articles,
                "rust",
                SearchOptions::default().with_limit(0),
            )
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_is_rolled_back() {
        let (engine, _temp) = open_engine();
        let good = article_document(&Article::new("Rust", "rust", "Ownership and borrowing"));
        let bad = article_document(&Article::new("Blank", "blank", "no id").with_id(""));

        let err = engine
            .index_batch(Collection::Articles, &[good, bad])
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidDocument(_)));
        assert!(!err.is_transient());

        // The next commit must not carry the staged half of the failed batch
        let next = article_document(&Article::new("Go", "go", "Goroutines and channels"));
        engine
            .index_batch(Collection::Articles, &[next])
            .await
            .unwrap();

        assert_eq!(engine.doc_count(Collection::Articles).unwrap(), 1);
        let hits = engine
            .search(Collection::Articles, "borrowing", SearchOptions::default())
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_concurrent_batches_on_single_thread_runtime() {
        let (engine, _temp) = open_engine();
        let articles = [article_document(&Article::new("Rust", "rust", "borrowing"))];
        let groups = [group_document(&Group::new("Rustaceans", "rustaceans", GroupType::Public))];

        let (a, c) = tokio::join!(
            engine.index_batch(Collection::Articles, &articles),
            engine.index_batch(Collection::Community, &groups),
        );
        a.unwrap();
        c.unwrap();

        assert_eq!(engine.doc_count(Collection::Articles).unwrap(), 1);
        assert_eq!(engine.doc_count(Collection::Community).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ensure_collections_creates_directories() {
        let (engine, temp) = open_engine();
        engine.ensure_collections().await.unwrap();
        assert!(temp.path().join("articles").join("meta.json").exists());
        assert!(temp.path().join("community").join("meta.json").exists());
    }
}
