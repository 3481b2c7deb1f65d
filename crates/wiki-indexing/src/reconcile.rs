//! Reconciliation loop: publish unindexed records to the search engine.
//!
//! Entity types run one after another (articles, groups, posts, comments).
//! Each runs FETCH → TRANSFORM → PUSH → MARK rounds until a fetch comes
//! back empty. The fetch cursor only moves forward within a run, so records
//! that stay unindexed (unresolved references) cannot stall the loop; they
//! are picked up again on the next run.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use wiki_search::SearchEngine;
use wiki_storage::{ArticleRepository, CommunityRepository, StoredRecord};
use wiki_types::EntityKind;

use crate::error::IndexingError;
use crate::pass::{ArticlePass, CommentPass, EntityPass, GroupPass, PostPass};

/// Configuration for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Records fetched per round
    pub batch_size: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

impl ReconcileConfig {
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

/// Counters for one entity type's run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Non-empty batches processed
    pub rounds: usize,
    pub fetched: usize,
    pub pushed: usize,
    pub marked: usize,
    pub unresolved: usize,
    pub mark_failures: usize,
    /// The run ended on a fetch or push failure instead of an empty batch
    pub aborted: bool,
}

/// Summaries of a full run, in the order the entity types ran.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub entities: Vec<(EntityKind, ReconcileSummary)>,
}

impl ReconcileReport {
    pub fn get(&self, kind: EntityKind) -> Option<&ReconcileSummary> {
        self.entities
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, summary)| summary)
    }

    pub fn total_marked(&self) -> usize {
        self.entities.iter().map(|(_, s)| s.marked).sum()
    }

    pub fn any_aborted(&self) -> bool {
        self.entities.iter().any(|(_, s)| s.aborted)
    }
}

enum Round {
    Empty,
    Done {
        fetched: usize,
        pushed: usize,
        marked: usize,
        unresolved: usize,
        mark_failures: usize,
    },
}

/// Sweeps every content collection into the search engine.
pub struct ReconciliationLoop {
    articles: Arc<dyn ArticleRepository>,
    community: Arc<dyn CommunityRepository>,
    engine: Arc<dyn SearchEngine>,
    config: ReconcileConfig,
}

impl ReconciliationLoop {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        community: Arc<dyn CommunityRepository>,
        engine: Arc<dyn SearchEngine>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            articles,
            community,
            engine,
            config,
        }
    }

    /// Reconcile every entity type, in order.
    pub async fn run(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for kind in EntityKind::ALL {
            let summary = self.run_kind(kind).await;
            report.entities.push((kind, summary));
        }
        info!(marked = report.total_marked(), "Reconciliation complete");
        report
    }

    /// Reconcile a single entity type.
    pub async fn run_kind(&self, kind: EntityKind) -> ReconcileSummary {
        match kind {
            EntityKind::Article => self.run_pass(&ArticlePass::new(self.articles.clone())).await,
            EntityKind::Group => self.run_pass(&GroupPass::new(self.community.clone())).await,
            EntityKind::Post => self.run_pass(&PostPass::new(self.community.clone())).await,
            EntityKind::Comment => self.run_pass(&CommentPass::new(self.community.clone())).await,
        }
    }

    async fn run_pass<P: EntityPass>(&self, pass: &P) -> ReconcileSummary {
        let kind = pass.kind();
        let mut summary = ReconcileSummary::default();
        let mut cursor: Option<String> = None;

        loop {
            match self.round(pass, &mut cursor).await {
                Ok(Round::Empty) => break,
                Ok(Round::Done {
                    fetched,
                    pushed,
                    marked,
                    unresolved,
                    mark_failures,
                }) => {
                    summary.rounds += 1;
                    summary.fetched += fetched;
                    summary.pushed += pushed;
                    summary.marked += marked;
                    summary.unresolved += unresolved;
                    summary.mark_failures += mark_failures;
                    debug!(
                        kind = %kind,
                        round = summary.rounds,
                        fetched,
                        pushed,
                        "Reconciled batch"
                    );
                }
                Err(e) => {
                    error!(kind = %kind, round = summary.rounds + 1, error = %e, "Reconciliation stopped");
                    summary.aborted = true;
                    break;
                }
            }
        }

        info!(
            kind = %kind,
            rounds = summary.rounds,
            marked = summary.marked,
            unresolved = summary.unresolved,
            aborted = summary.aborted,
            "Reconciled {}",
            kind.plural()
        );
        summary
    }

    async fn round<P: EntityPass>(
        &self,
        pass: &P,
        cursor: &mut Option<String>,
    ) -> Result<Round, IndexingError> {
        let batch = pass
            .fetch(cursor.as_deref(), self.config.batch_size)
            .await?;
        let Some(last) = batch.last() else {
            return Ok(Round::Empty);
        };
        *cursor = Some(last.id().to_string());

        let transformed = pass.transform(&batch).await;
        let docs = transformed.documents;

        let mut marked = 0;
        let mut mark_failures = 0;
        if !docs.is_empty() {
            self.engine.index_batch(pass.collection(), &docs).await?;

            for doc in &docs {
                match pass.mark_indexed(doc.id()).await {
                    Ok(()) => marked += 1,
                    Err(e) => {
                        warn!(kind = %pass.kind(), id = doc.id(), error = %e, "Failed to mark indexed");
                        mark_failures += 1;
                    }
                }
            }
        }

        Ok(Round::Done {
            fetched: batch.len(),
            pushed: docs.len(),
            marked,
            unresolved: transformed.unresolved.len(),
            mark_failures,
        })
    }
}
