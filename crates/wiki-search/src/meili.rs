//! Meilisearch client over HTTP.
//!
//! Document pushes and settings updates are enqueued as Meilisearch tasks;
//! an accepted request (2xx) is treated as success without polling the
//! task. Transient failures are retried with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use wiki_types::SearchSettings;

use crate::document::{Collection, IndexDocument};
use crate::engine::SearchEngine;
use crate::error::SearchError;

/// Configuration for the Meilisearch client.
#[derive(Debug, Clone)]
pub struct MeiliConfig {
    /// Server base URL (e.g., "http://localhost:7700")
    pub host: String,

    /// Master or API key, sent as a bearer token
    pub api_key: Option<SecretString>,

    /// Request timeout
    pub timeout: Duration,

    /// Maximum attempts per request
    pub max_retries: u32,

    /// Upper bound on time spent retrying one request
    pub max_elapsed: Duration,
}

impl MeiliConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            max_elapsed: Duration::from_secs(120),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from the `[search]` settings section.
    pub fn from_settings(settings: &SearchSettings) -> Self {
        let mut config = Self::new(settings.meili_host.clone())
            .with_max_retries(settings.max_retries)
            .with_timeout(Duration::from_secs(settings.timeout_secs));
        if let Some(key) = settings.meili_api_key.as_deref().filter(|k| !k.is_empty()) {
            config = config.with_api_key(key);
        }
        config
    }
}

/// Response body of an enqueued Meilisearch task
#[derive(Debug, Deserialize)]
struct TaskInfo {
    #[serde(rename = "taskUid")]
    task_uid: u64,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    uid: &'a str,
    #[serde(rename = "primaryKey")]
    primary_key: &'a str,
}

/// Meilisearch-backed search engine.
pub struct MeiliClient {
    client: Client,
    config: MeiliConfig,
}

impl MeiliClient {
    pub fn new(config: MeiliConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.host.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }

    /// Send a request built by `build`, retrying transient failures.
    async fn send_with_retry<F>(&self, what: &str, build: F) -> Result<TaskInfo, SearchError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.config.max_elapsed),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, request = what, "Calling Meilisearch");

            match self.send_once(build()).await {
                Ok(task) => return Ok(task),
                Err(e) => {
                    if !e.is_transient() || attempts >= self.config.max_retries {
                        error!(error = %e, request = what, attempts, "Meilisearch request failed");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                request = what,
                                retry_in_ms = duration.as_millis(),
                                "Meilisearch request failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(error = %e, request = what, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    async fn send_once(&self, request: RequestBuilder) -> Result<TaskInfo, SearchError> {
        let response = self.authorize(request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    /// Create an index with `id` as primary key.
    ///
    /// Creation of an index that already exists fails inside the task, not
    /// on the request, so this is safe to call at every start-up.
    pub async fn create_index(&self, collection: Collection) -> Result<u64, SearchError> {
        let url = self.url("/indexes");
        let body = CreateIndexRequest {
            uid: collection.as_str(),
            primary_key: "id",
        };
        let task = self
            .send_with_retry("create_index", || self.client.post(&url).json(&body))
            .await?;
        info!(collection = %collection, task_uid = task.task_uid, "Requested index creation");
        Ok(task.task_uid)
    }

    /// Replace the filterable attributes of an index.
    pub async fn update_filterable_attributes(
        &self,
        collection: Collection,
        attributes: &[&str],
    ) -> Result<u64, SearchError> {
        let url = self.url(&format!(
            "/indexes/{}/settings/filterable-attributes",
            collection.as_str()
        ));
        let task = self
            .send_with_retry("update_filterable_attributes", || {
                self.client.put(&url).json(&attributes)
            })
            .await?;
        info!(
            collection = %collection,
            task_uid = task.task_uid,
            "Requested filterable attributes update"
        );
        Ok(task.task_uid)
    }

    /// Add or replace documents, keyed by `id`.
    pub async fn add_documents(
        &self,
        collection: Collection,
        docs: &[IndexDocument],
    ) -> Result<u64, SearchError> {
        let url = self.url(&format!(
            "/indexes/{}/documents?primaryKey=id",
            collection.as_str()
        ));
        let task = self
            .send_with_retry("add_documents", || self.client.post(&url).json(docs))
            .await?;
        info!(
            collection = %collection,
            count = docs.len(),
            task_uid = task.task_uid,
            "Enqueued documents"
        );
        Ok(task.task_uid)
    }
}

#[async_trait]
impl SearchEngine for MeiliClient {
    async fn ensure_collections(&self) -> Result<(), SearchError> {
        for collection in Collection::ALL {
            if let Err(e) = self.create_index(collection).await {
                // Start-up continues: the index may already exist.
                warn!(collection = %collection, error = %e, "Index creation failed");
            }
        }

        self.update_filterable_attributes(
            Collection::Community,
            Collection::Community.filterable_attributes(),
        )
        .await?;
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
        self.add_documents(collection, docs).await.map(|_| ())
    }
}
