//! wiki-sync
//!
//! Maintains derived state for the wiki: backlinks between articles and the
//! search indexes mirrored from the content store.
//!
//! # Usage
//!
//! ```bash
//! wiki-sync reconcile [--only articles|groups|posts|comments] [--batch-size N]
//! wiki-sync create-article --title TITLE --slug SLUG [--content TEXT | --content-file PATH]
//! wiki-sync backlinks ARTICLE_ID
//! wiki-sync stats
//! wiki-sync search articles|community QUERY [--limit N]
//! wiki-sync reset-index articles|groups|posts|comments
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/wiki-sync/config.toml)
//! 3. Environment variables (WIKI_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use wiki_search::SearchOptions;
use wiki_sync::{
    backlinks, create_article, init_logging, load_settings, print_hits, print_reconcile_report,
    print_stats, reconcile, reset_index, search, stats, Cli, Commands, NewArticle,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.globals())?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Reconcile { only, batch_size } => {
            let report = reconcile(&settings, only.map(Into::into), batch_size).await?;
            print_reconcile_report(&report);
            if report.any_aborted() {
                anyhow::bail!("Reconciliation did not finish; unindexed records remain");
            }
        }
        Commands::CreateArticle {
            title,
            slug,
            content,
            content_file,
            category,
            author,
            thumbnail,
        } => {
            let article = create_article(
                &settings,
                NewArticle {
                    title,
                    slug,
                    content,
                    content_file,
                    category,
                    author,
                    thumbnail,
                },
            )
            .await?;
            println!("Created article {} ({})", article.id, article.slug);
        }
        Commands::Backlinks { article_id } => {
            let summary = backlinks(&settings, &article_id).await?;
            println!(
                "Scanned {} of {} articles in {} partitions: {} updated, {} write failures, {} failed partitions",
                summary.scanned,
                summary.total,
                summary.partitions,
                summary.updated,
                summary.write_failures,
                summary.failed_partitions
            );
        }
        Commands::Stats => {
            let stats = stats(&settings)?;
            print_stats(&settings, &stats)?;
        }
        Commands::Search {
            collection,
            query,
            limit,
            doc_type,
            group_type,
        } => {
            let mut options = SearchOptions::default().with_limit(limit);
            if let Some(doc_type) = doc_type {
                options = options.with_doc_type(doc_type);
            }
            if let Some(group_type) = group_type {
                options = options.with_group_type(group_type);
            }
            let hits = search(&settings, collection, &query, options)?;
            print_hits(&hits);
        }
        Commands::ResetIndex { kind } => {
            let kind = kind.into();
            let cleared = reset_index(&settings, kind)?;
            println!("Cleared indexed flag on {} {}", cleared, kind.plural());
        }
    }

    Ok(())
}
