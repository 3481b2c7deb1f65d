//! Backlink E2E tests.
//!
//! Runs backlink passes against a real RocksDB store: partitioned reads,
//! self-exclusion, whole-word matching, idempotence and detached passes
//! drained through the trigger.

use pretty_assertions::assert_eq;

use e2e_tests::{seed_articles, seed_bulk_articles, seq_id, TestHarness};
use wiki_backlinks::{partition, BacklinkJob, BacklinkPool, BacklinkTrigger};
use wiki_types::{Article, EntityKind};

fn ten_articles() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("Languages", "languages", "Go is a language."),
        ("Mascots", "mascots", "Gopher is the mascot."),
        ("Taste", "taste", "I like go and GO."),
        ("Go", "go", "Go, also called Golang."),
        ("Empty", "empty", "Nothing here."),
        ("Linked", "linked", "Already [Go](/articles/go) linked."),
        ("Tooling", "tooling", "`go build` compiles."),
        ("Learning", "learning", "Learn Go."),
        ("Latin", "latin", "cogito ergo sum"),
        ("Shout", "shout", "Go!"),
    ]
}

#[test]
fn test_ten_articles_four_workers_layout() {
    let ranges: Vec<(u64, u64)> = partition(10, 4)
        .iter()
        .map(|p| (p.offset, p.end()))
        .collect();
    assert_eq!(ranges, vec![(0, 2), (2, 4), (4, 6), (6, 10)]);
}

#[tokio::test]
async fn test_ten_articles_four_workers() {
    let harness = TestHarness::new();
    let articles = seed_articles(&harness.storage, &ten_articles());
    let go = &articles[3];

    let pool = BacklinkPool::new(harness.storage.clone(), 4);
    let summary = pool.run_pass(&BacklinkJob::from(go)).await.unwrap();

    assert_eq!(summary.total, 10);
    assert_eq!(summary.partitions, 4);
    assert_eq!(summary.scanned, 10);
    assert_eq!(summary.self_skipped, 1);
    assert_eq!(summary.updated, 4);
    assert_eq!(summary.write_failures, 0);
    assert_eq!(summary.failed_partitions, 0);

    let contents: Vec<String> = articles.iter().map(|a| harness.content(&a.id)).collect();
    assert_eq!(
        contents,
        vec![
            "[Go](/articles/go) is a language.",
            "Gopher is the mascot.",
            "I like [go](/articles/go) and [GO](/articles/go).",
            "Go, also called Golang.",
            "Nothing here.",
            "Already [Go](/articles/go) linked.",
            "`go build` compiles.",
            "Learn [Go](/articles/go).",
            "cogito ergo sum",
            "[Go](/articles/go)!",
        ]
    );
}

#[tokio::test]
async fn test_second_pass_changes_nothing() {
    let harness = TestHarness::new();
    let articles = seed_articles(&harness.storage, &ten_articles());
    let pool = BacklinkPool::new(harness.storage.clone(), 3);
    let job = BacklinkJob::from(&articles[3]);

    pool.run_pass(&job).await.unwrap();
    let before: Vec<String> = articles.iter().map(|a| harness.content(&a.id)).collect();

    let summary = pool.run_pass(&job).await.unwrap();
    assert_eq!(summary.updated, 0);

    let after: Vec<String> = articles.iter().map(|a| harness.content(&a.id)).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_symbol_title_links_on_word_edge_only() {
    let harness = TestHarness::new();
    let articles = seed_articles(
        &harness.storage,
        &[
            ("C++", "cpp", "C++ is a language."),
            ("Compilers", "compilers", "Compile C++, or C++17, but not ABC++."),
        ],
    );

    let pool = BacklinkPool::new(harness.storage.clone(), 2);
    pool.run_pass(&BacklinkJob::from(&articles[0])).await.unwrap();

    assert_eq!(
        harness.content(&articles[1].id),
        "Compile [C++](/articles/cpp), or [C++](/articles/cpp)17, but not ABC++."
    );
    assert_eq!(harness.content(&articles[0].id), "C++ is a language.");
}

#[tokio::test]
async fn test_fewer_articles_than_workers() {
    let harness = TestHarness::new();
    let articles = seed_articles(
        &harness.storage,
        &[
            ("Rust", "rust", "Rust is a language."),
            ("Cargo", "cargo", "Cargo builds Rust code."),
        ],
    );

    let pool = BacklinkPool::new(harness.storage.clone(), 8);
    let summary = pool.run_pass(&BacklinkJob::from(&articles[0])).await.unwrap();

    assert_eq!(summary.partitions, 1);
    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.updated, 1);
    assert_eq!(
        harness.content(&articles[1].id),
        "Cargo builds [Rust](/articles/rust) code."
    );
}

#[tokio::test]
async fn test_large_corpus_every_article_visited_once() {
    let harness = TestHarness::new();
    let mut articles = seed_bulk_articles(&harness.storage, 103);
    let tokio = Article::new("Tokio", "tokio", "An async runtime.").with_id(seq_id("art", 103));
    harness.storage.put_article(&tokio).unwrap();

    for article in articles.iter_mut().step_by(10) {
        article.content = format!("{} Uses Tokio.", article.content);
        harness.storage.put_article(article).unwrap();
    }

    let pool = BacklinkPool::new(harness.storage.clone(), 4);
    let summary = pool.run_pass(&BacklinkJob::from(&tokio)).await.unwrap();

    assert_eq!(summary.total, 104);
    assert_eq!(summary.scanned, 104);
    assert_eq!(summary.self_skipped, 1);
    assert_eq!(summary.updated, 11);
    assert!(harness.content(&articles[100].id).ends_with("Uses [Tokio](/articles/tokio)."));
    assert!(!harness.content(&articles[101].id).contains("Tokio"));
}

#[tokio::test]
async fn test_trigger_drains_detached_passes() {
    let harness = TestHarness::new();
    let articles = seed_articles(
        &harness.storage,
        &[
            ("Rust", "rust", "A systems language."),
            ("Tokio", "tokio", "An async runtime."),
            ("Notes", "notes", "Rust and Tokio work well together."),
        ],
    );

    let trigger = BacklinkTrigger::new(BacklinkPool::new(harness.storage.clone(), 2));
    trigger.fire(BacklinkJob::from(&articles[0]));
    let handle = trigger.fire(BacklinkJob::from(&articles[1]));
    trigger.drain().await;

    assert_eq!(trigger.in_flight(), 0);
    assert!(handle.wait().await.is_some());

    // Overlapping passes may lose one another's rewrite; each title must
    // have been linked by at least its own pass at the time it ran.
    let notes = harness.content(&articles[2].id);
    assert!(
        notes.contains("[Rust](/articles/rust)") || notes.contains("[Tokio](/articles/tokio)"),
        "unexpected content: {}",
        notes
    );

    let summary = BacklinkPool::new(harness.storage.clone(), 2)
        .run_pass(&BacklinkJob::from(&articles[0]))
        .await
        .unwrap();
    assert!(summary.updated <= 1);
    assert!(harness.content(&articles[2].id).contains("[Rust](/articles/rust)"));
}

#[tokio::test]
async fn test_rewrite_keeps_indexed_flag() {
    let harness = TestHarness::new();
    let articles = seed_articles(
        &harness.storage,
        &[
            ("Rust", "rust", "A systems language."),
            ("Cargo", "cargo", "Cargo builds Rust code."),
        ],
    );
    harness
        .storage
        .set_indexed(EntityKind::Article, &articles[1].id)
        .unwrap();

    BacklinkPool::new(harness.storage.clone(), 2)
        .run_pass(&BacklinkJob::from(&articles[0]))
        .await
        .unwrap();

    let cargo = harness.storage.get_article(&articles[1].id).unwrap().unwrap();
    assert_eq!(cargo.content, "Cargo builds [Rust](/articles/rust) code.");
    assert!(cargo.indexed);
}
