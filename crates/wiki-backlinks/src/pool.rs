//! Backlink worker pool.
//!
//! One pass counts the corpus, partitions it and spawns one task per
//! partition. Each task reads its slice, rewrites every other article that
//! mentions the new title and writes back only what changed. Failures stay
//! inside the task or record that produced them.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use wiki_storage::ArticleRepository;
use wiki_types::Article;

use crate::error::BacklinkError;
use crate::matcher::TitleMatcher;
use crate::partition::{partition, Partition};

/// A request to link one newly created article into the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklinkJob {
    /// Id of the new article, excluded from its own pass
    pub article_id: String,
    pub title: String,
    pub slug: String,
}

impl BacklinkJob {
    pub fn new(
        article_id: impl Into<String>,
        title: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            article_id: article_id.into(),
            title: title.into(),
            slug: slug.into(),
        }
    }
}

impl From<&Article> for BacklinkJob {
    fn from(article: &Article) -> Self {
        Self::new(&article.id, &article.title, &article.slug)
    }
}

/// Outcome counters of one pass, for logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Corpus size observed when the pass started
    pub total: u64,
    pub partitions: usize,
    pub scanned: u64,
    pub self_skipped: u64,
    pub updated: u64,
    pub write_failures: u64,
    pub failed_partitions: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: &PartitionOutcome) {
        self.scanned += outcome.scanned;
        self.self_skipped += outcome.self_skipped;
        self.updated += outcome.updated;
        self.write_failures += outcome.write_failures;
        if outcome.failed {
            self.failed_partitions += 1;
        }
    }
}

#[derive(Debug, Default)]
struct PartitionOutcome {
    scanned: u64,
    self_skipped: u64,
    updated: u64,
    write_failures: u64,
    failed: bool,
}

/// Runs backlink passes against an article repository.
pub struct BacklinkPool {
    repo: Arc<dyn ArticleRepository>,
    workers: usize,
}

impl BacklinkPool {
    /// Create a pool running `workers` tasks per pass (minimum 1).
    pub fn new(repo: Arc<dyn ArticleRepository>, workers: usize) -> Self {
        Self {
            repo,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run one pass to completion.
    ///
    /// Returns `Err` only when the corpus cannot be counted; every other
    /// failure is logged and reflected in the summary.
    pub async fn run_pass(&self, job: &BacklinkJob) -> Result<PassSummary, BacklinkError> {
        let Some(matcher) = TitleMatcher::new(&job.title, &job.slug) else {
            debug!(article_id = %job.article_id, "Blank title or slug, nothing to link");
            return Ok(PassSummary::default());
        };

        let total = self
            .repo
            .count_articles()
            .await
            .map_err(BacklinkError::Count)?;
        let partitions = partition(total, self.workers);

        let mut summary = PassSummary {
            total,
            partitions: partitions.len(),
            ..Default::default()
        };

        let matcher = Arc::new(matcher);
        let article_id: Arc<str> = Arc::from(job.article_id.as_str());

        let mut tasks = JoinSet::new();
        for part in partitions {
            let repo = self.repo.clone();
            let matcher = matcher.clone();
            let article_id = article_id.clone();
            tasks.spawn(async move { process_partition(repo, &matcher, &article_id, part).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!(error = %e, "Backlink worker panicked");
                    summary.failed_partitions += 1;
                }
            }
        }

        info!(
            article_id = %job.article_id,
            title = %job.title,
            total = summary.total,
            updated = summary.updated,
            write_failures = summary.write_failures,
            failed_partitions = summary.failed_partitions,
            "Backlink pass complete"
        );
        Ok(summary)
    }
}

async fn process_partition(
    repo: Arc<dyn ArticleRepository>,
    matcher: &TitleMatcher,
    article_id: &str,
    part: Partition,
) -> PartitionOutcome {
    let mut outcome = PartitionOutcome::default();

    let articles = match repo.articles_range(part.offset, part.limit).await {
        Ok(articles) => articles,
        Err(e) => {
            error!(
                worker = part.worker,
                offset = part.offset,
                limit = part.limit,
                error = %e,
                "Failed to read partition"
            );
            outcome.failed = true;
            return outcome;
        }
    };

    for article in articles {
        outcome.scanned += 1;
        if article.id == article_id {
            outcome.self_skipped += 1;
            continue;
        }

        let updated = matcher.link(&article.content);
        if updated == article.content {
            continue;
        }

        match repo.update_article_content(&article.id, &updated).await {
            Ok(()) => {
                debug!(worker = part.worker, id = %article.id, "Linked article");
                outcome.updated += 1;
            }
            Err(e) => {
                warn!(worker = part.worker, id = %article.id, error = %e, "Failed to write article");
                outcome.write_failures += 1;
            }
        }
    }

    outcome
}
