//! Detached execution of backlink passes.
//!
//! The article-creation path fires a pass and moves on. Passes run on the
//! Tokio runtime, tracked by a [`TaskTracker`] so the process can wait for
//! outstanding work before exiting.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use crate::pool::{BacklinkJob, BacklinkPool, PassSummary};

/// Handle to one fired pass.
///
/// Dropping it detaches the pass; it keeps running to completion.
#[derive(Debug)]
pub struct BacklinkHandle {
    inner: JoinHandle<Option<PassSummary>>,
}

impl BacklinkHandle {
    /// Wait for the pass. `None` if it aborted before dispatch or panicked.
    pub async fn wait(self) -> Option<PassSummary> {
        match self.inner.await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Backlink pass task failed");
                None
            }
        }
    }
}

/// Fires one backlink pass per newly created article.
#[derive(Clone)]
pub struct BacklinkTrigger {
    pool: Arc<BacklinkPool>,
    tracker: TaskTracker,
}

impl BacklinkTrigger {
    pub fn new(pool: BacklinkPool) -> Self {
        Self {
            pool: Arc::new(pool),
            tracker: TaskTracker::new(),
        }
    }

    /// Schedule a pass and return immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn fire(&self, job: BacklinkJob) -> BacklinkHandle {
        let pool = self.pool.clone();
        let inner = self.tracker.spawn(async move {
            match pool.run_pass(&job).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    error!(article_id = %job.article_id, error = %e, "Backlink pass aborted");
                    None
                }
            }
        });
        BacklinkHandle { inner }
    }

    /// Number of passes still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every pass fired so far.
    ///
    /// Running passes are not cancelled. Passes fired after this call
    /// starts are also awaited.
    pub async fn drain(&self) {
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "Waiting for backlink passes");
        }
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
