//! End-to-end test infrastructure for wiki-sync.
//!
//! Provides a shared TestHarness and helpers that seed a real RocksDB
//! store and embedded search index for backlink and reconciliation tests.

use std::path::PathBuf;
use std::sync::Arc;

use wiki_indexing::{ReconcileConfig, ReconciliationLoop};
use wiki_search::{SearchEngine, TantivyConfig, TantivyEngine};
use wiki_storage::Storage;
use wiki_types::{Article, Comment, Group, GroupType, Post};

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub storage: Arc<Storage>,
    pub engine: Arc<TantivyEngine>,
    pub index_path: PathBuf,
}

impl TestHarness {
    /// Create a new test harness with temp directory, storage and embedded index.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage = Arc::new(
            Storage::open(&temp_dir.path().join("db")).expect("Failed to open test storage"),
        );

        let index_path = temp_dir.path().join("search-index");
        let engine = Arc::new(
            TantivyEngine::open(TantivyConfig::new(&index_path).with_memory_mb(20))
                .expect("Failed to open search index"),
        );

        Self {
            _temp_dir: temp_dir,
            storage,
            engine,
            index_path,
        }
    }

    /// Reconciliation loop over this harness' store and embedded index.
    pub fn reconciler(&self, batch_size: usize) -> ReconciliationLoop {
        self.reconciler_with(self.engine.clone(), batch_size)
    }

    /// Reconciliation loop over this harness' store and any engine.
    pub fn reconciler_with(
        &self,
        engine: Arc<dyn SearchEngine>,
        batch_size: usize,
    ) -> ReconciliationLoop {
        ReconciliationLoop::new(
            self.storage.clone(),
            self.storage.clone(),
            engine,
            ReconcileConfig::default().with_batch_size(batch_size),
        )
    }

    /// Current body of a stored article.
    pub fn content(&self, id: &str) -> String {
        self.storage
            .get_article(id)
            .expect("Failed to read article")
            .expect("Article missing")
            .content
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-padded id so store order matches creation order.
pub fn seq_id(prefix: &str, n: usize) -> String {
    format!("{}-{:05}", prefix, n)
}

/// Store articles with ids `art-00000`, `art-00001`, ... in the given order.
pub fn seed_articles(storage: &Storage, articles: &[(&str, &str, &str)]) -> Vec<Article> {
    articles
        .iter()
        .enumerate()
        .map(|(i, (title, slug, content))| {
            let article = Article::new(*title, *slug, *content).with_id(seq_id("art", i));
            storage.put_article(&article).expect("Failed to put article");
            article
        })
        .collect()
}

/// Store `count` filler articles titled "Article N".
pub fn seed_bulk_articles(storage: &Storage, count: usize) -> Vec<Article> {
    (0..count)
        .map(|i| {
            let article = Article::new(
                format!("Article {}", i),
                format!("article-{}", i),
                format!("Body of article number {}.", i),
            )
            .with_id(seq_id("art", i));
            storage.put_article(&article).expect("Failed to put article");
            article
        })
        .collect()
}

/// Seeded community content.
pub struct Community {
    pub groups: Vec<Group>,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
}

impl Community {
    pub fn len(&self) -> usize {
        self.groups.len() + self.posts.len() + self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Store `groups` groups (alternating public/private), each with
/// `posts_per_group` posts carrying `comments_per_post` comments.
pub fn seed_community(
    storage: &Storage,
    groups: usize,
    posts_per_group: usize,
    comments_per_post: usize,
) -> Community {
    let mut community = Community {
        groups: Vec::new(),
        posts: Vec::new(),
        comments: Vec::new(),
    };

    for g in 0..groups {
        let group_type = if g % 2 == 0 {
            GroupType::Public
        } else {
            GroupType::Private
        };
        let mut group = Group::new(format!("Group {}", g), format!("group-{}", g), group_type);
        group.id = seq_id("grp", g);
        storage.put_group(&group).expect("Failed to put group");

        for p in 0..posts_per_group {
            let n = g * posts_per_group + p;
            let mut post = Post::new(
                &group.id,
                format!("Post {}", n),
                format!("Discussion thread {} in group {}", n, g),
            );
            post.id = seq_id("pst", n);
            storage.put_post(&post).expect("Failed to put post");

            for c in 0..comments_per_post {
                let m = n * comments_per_post + c;
                let mut comment = Comment::new(&post.id, format!("Reply {} to post {}", m, n));
                comment.id = seq_id("cmt", m);
                storage.put_comment(&comment).expect("Failed to put comment");
                community.comments.push(comment);
            }
            community.posts.push(post);
        }
        community.groups.push(group);
    }

    community
}
