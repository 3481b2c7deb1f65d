//! Command implementations for wiki-sync.
//!
//! Handlers take fully resolved [`Settings`]; `main` loads them and sets up
//! logging before dispatching.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use wiki_backlinks::{BacklinkJob, BacklinkPool, BacklinkTrigger, PassSummary};
use wiki_indexing::{ReconcileConfig, ReconcileReport, ReconciliationLoop};
use wiki_search::{
    Collection, MeiliClient, MeiliConfig, SearchEngine, SearchHit, SearchOptions, TantivyConfig,
    TantivyEngine,
};
use wiki_storage::{EntityStats, Storage};
use wiki_types::{Article, EntityKind, SearchBackend, Settings};

use crate::cli::GlobalOptions;

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(globals: &GlobalOptions) -> Result<Settings> {
    let mut settings =
        Settings::load(globals.config.as_deref()).context("Failed to load configuration")?;

    if let Some(db_path) = &globals.db_path {
        settings.db_path = db_path.clone();
    }
    if let Some(log_level) = &globals.log_level {
        settings.log_level = log_level.clone();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let db_path = settings.expanded_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    info!("Opening storage at {:?}", db_path);
    let storage = Storage::open(&db_path).context("Failed to open storage")?;
    Ok(Arc::new(storage))
}

fn open_embedded(settings: &Settings) -> Result<TantivyEngine> {
    let index_path = settings.expanded_index_path();
    TantivyEngine::open(TantivyConfig::new(&index_path))
        .with_context(|| format!("Failed to open search index at {:?}", index_path))
}

fn open_engine(settings: &Settings) -> Result<Arc<dyn SearchEngine>> {
    match settings.search.backend {
        SearchBackend::Tantivy => Ok(Arc::new(open_embedded(settings)?)),
        SearchBackend::Meilisearch => {
            info!(host = %settings.search.meili_host, "Using Meilisearch backend");
            let client = MeiliClient::new(MeiliConfig::from_settings(&settings.search))
                .context("Failed to build Meilisearch client")?;
            Ok(Arc::new(client))
        }
    }
}

/// Run the reconciliation loop once, for every entity type or just `only`.
pub async fn reconcile(
    settings: &Settings,
    only: Option<EntityKind>,
    batch_size: Option<usize>,
) -> Result<ReconcileReport> {
    let storage = open_storage(settings)?;
    let engine = open_engine(settings)?;

    // Pushes report their own failures; a setup failure alone does not stop the run.
    if let Err(e) = engine.ensure_collections().await {
        warn!(error = %e, "Failed to prepare search collections, reconciling anyway");
    }

    let config = ReconcileConfig::default()
        .with_batch_size(batch_size.unwrap_or(settings.reconcile.batch_size));
    let reconciler = ReconciliationLoop::new(storage.clone(), storage.clone(), engine, config);

    let report = match only {
        Some(kind) => ReconcileReport {
            entities: vec![(kind, reconciler.run_kind(kind).await)],
        },
        None => reconciler.run().await,
    };
    storage.flush().context("Failed to flush storage")?;
    Ok(report)
}

/// Print a reconcile report as a table.
pub fn print_reconcile_report(report: &ReconcileReport) {
    println!(
        "{:<10} {:>7} {:>8} {:>7} {:>7} {:>11} {:>9}",
        "ENTITY", "ROUNDS", "FETCHED", "PUSHED", "MARKED", "UNRESOLVED", "STATUS"
    );
    for (kind, summary) in &report.entities {
        println!(
            "{:<10} {:>7} {:>8} {:>7} {:>7} {:>11} {:>9}",
            kind.plural(),
            summary.rounds,
            summary.fetched,
            summary.pushed,
            summary.marked,
            summary.unresolved,
            if summary.aborted { "aborted" } else { "done" }
        );
    }
}

/// Article fields given to `create-article`.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub content_file: Option<PathBuf>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
}

fn read_content(content: Option<String>, content_file: Option<&Path>) -> Result<String> {
    match (content, content_file) {
        (Some(content), _) => Ok(content),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content file {:?}", path)),
        (None, None) => Ok(String::new()),
    }
}

/// Persist an article, then fire a backlink pass for it.
///
/// The pass runs detached; the trigger is drained before returning so the
/// process does not exit with rewrites half done.
pub async fn create_article(settings: &Settings, new: NewArticle) -> Result<Article> {
    if new.title.trim().is_empty() || new.slug.trim().is_empty() {
        bail!("Article title and slug must not be empty");
    }
    let content = read_content(new.content, new.content_file.as_deref())?;

    let mut article = Article::new(new.title, new.slug, content);
    if let Some(category) = new.category {
        article = article.with_category(category);
    }
    if let Some(author) = new.author {
        article = article.with_author(author);
    }
    if let Some(thumbnail) = new.thumbnail {
        article = article.with_thumbnail(thumbnail);
    }

    let storage = open_storage(settings)?;
    storage
        .put_article(&article)
        .context("Failed to store article")?;
    info!(article_id = %article.id, slug = %article.slug, "Article created");

    let trigger = BacklinkTrigger::new(BacklinkPool::new(
        storage.clone(),
        settings.backlinks.worker_count,
    ));
    trigger.fire(BacklinkJob::from(&article));
    trigger.drain().await;

    storage.flush().context("Failed to flush storage")?;
    Ok(article)
}

/// Run a backlink pass in the foreground for an existing article.
pub async fn backlinks(settings: &Settings, article_id: &str) -> Result<PassSummary> {
    let storage = open_storage(settings)?;
    let article = storage
        .get_article(article_id)
        .context("Failed to read article")?
        .with_context(|| format!("Article not found: {}", article_id))?;

    let pool = BacklinkPool::new(storage.clone(), settings.backlinks.worker_count);
    let summary = pool
        .run_pass(&BacklinkJob::from(&article))
        .await
        .context("Backlink pass failed")?;

    storage.flush().context("Failed to flush storage")?;
    Ok(summary)
}

/// Record counts per entity type.
pub fn stats(settings: &Settings) -> Result<Vec<EntityStats>> {
    let storage = open_storage(settings)?;
    storage.stats().context("Failed to read storage stats")
}

pub fn print_stats(settings: &Settings, stats: &[EntityStats]) -> Result<()> {
    println!("Database: {:?}", settings.expanded_db_path());
    println!();
    println!("{:<10} {:>10} {:>10} {:>10}", "ENTITY", "TOTAL", "INDEXED", "PENDING");
    for entry in stats {
        println!(
            "{:<10} {:>10} {:>10} {:>10}",
            entry.kind.plural(),
            entry.total,
            entry.indexed,
            entry.pending()
        );
    }

    if settings.search.backend == SearchBackend::Tantivy {
        let engine = open_embedded(settings)?;
        println!();
        println!("Search index: {:?}", engine.root());
        for collection in Collection::ALL {
            println!(
                "  {:<10} {:>10} documents",
                collection.as_str(),
                engine.doc_count(collection)?
            );
        }
    }
    Ok(())
}

/// Query the embedded index.
pub fn search(
    settings: &Settings,
    collection: Collection,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<SearchHit>> {
    if settings.search.backend != SearchBackend::Tantivy {
        bail!("The search command only queries the embedded index (search.backend = \"tantivy\")");
    }
    let engine = open_embedded(settings)?;
    engine
        .search(collection, query, options)
        .context("Search failed")
}

pub fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No results.");
        return;
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>3}. [{:.3}] {:<8} {}  {}",
            rank + 1,
            hit.score,
            hit.doc_type,
            hit.id,
            hit.title
        );
    }
}

/// Clear the indexed flag for every record of `kind`.
pub fn reset_index(settings: &Settings, kind: EntityKind) -> Result<usize> {
    let storage = open_storage(settings)?;
    let cleared = storage
        .reset_indexed(kind)
        .with_context(|| format!("Failed to reset {}", kind.plural()))?;
    storage.flush().context("Failed to flush storage")?;
    Ok(cleared)
}
