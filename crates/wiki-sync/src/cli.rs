//! CLI argument parsing for wiki-sync.
//!
//! CLI flags override every other config source.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wiki_search::Collection;
use wiki_types::EntityKind;

/// Wiki derived-state maintenance
///
/// Keeps article backlinks and the search indexes in step with the content store.
#[derive(Parser, Debug)]
#[command(name = "wiki-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/wiki-sync/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn globals(&self) -> GlobalOptions {
        GlobalOptions {
            config: self.config.clone(),
            log_level: self.log_level.clone(),
            db_path: self.db_path.clone(),
        }
    }
}

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<String>,
    pub log_level: Option<String>,
    pub db_path: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish every unindexed record to the search engine
    Reconcile {
        /// Reconcile a single entity type
        #[arg(long, value_enum)]
        only: Option<KindArg>,

        /// Override records fetched per round
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Store a new article and link its title into existing articles
    CreateArticle {
        #[arg(long)]
        title: String,

        #[arg(long)]
        slug: String,

        /// Article body (Markdown)
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,

        /// Read the article body from a file
        #[arg(long)]
        content_file: Option<PathBuf>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// Thumbnail image URL
        #[arg(long)]
        thumbnail: Option<String>,
    },

    /// Re-run the backlink pass for an existing article
    Backlinks {
        /// Article id
        article_id: String,
    },

    /// Show per-entity record and unindexed counts
    Stats,

    /// Query the embedded search index
    Search {
        /// Collection to search (articles, community)
        collection: Collection,

        query: String,

        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// Filter community results by document type (group, post, comment)
        #[arg(long = "type")]
        doc_type: Option<String>,

        /// Filter community results by group type (PUBLIC, PRIVATE)
        #[arg(long)]
        group_type: Option<String>,
    },

    /// Clear the indexed flag so the next reconcile re-publishes everything
    ResetIndex {
        #[arg(value_enum)]
        kind: KindArg,
    },
}

/// Entity type as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Articles,
    Groups,
    Posts,
    Comments,
}

impl From<KindArg> for EntityKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Articles => EntityKind::Article,
            KindArg::Groups => EntityKind::Group,
            KindArg::Posts => EntityKind::Post,
            KindArg::Comments => EntityKind::Comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_reconcile() {
        let cli = Cli::parse_from(["wiki-sync", "reconcile"]);
        match cli.command {
            Commands::Reconcile { only, batch_size } => {
                assert!(only.is_none());
                assert!(batch_size.is_none());
            }
            _ => panic!("Expected Reconcile command"),
        }
    }

    #[test]
    fn test_cli_reconcile_only_posts() {
        let cli = Cli::parse_from(["wiki-sync", "reconcile", "--only", "posts", "--batch-size", "50"]);
        match cli.command {
            Commands::Reconcile { only, batch_size } => {
                assert_eq!(only.map(EntityKind::from), Some(EntityKind::Post));
                assert_eq!(batch_size, Some(50));
            }
            _ => panic!("Expected Reconcile command"),
        }
    }

    #[test]
    fn test_cli_create_article() {
        let cli = Cli::parse_from([
            "wiki-sync",
            "create-article",
            "--title",
            "Go",
            "--slug",
            "go-lang",
            "--content",
            "Go is a language.",
            "--category",
            "languages",
        ]);
        match cli.command {
            Commands::CreateArticle {
                title,
                slug,
                content,
                content_file,
                category,
                author,
                thumbnail,
            } => {
                assert_eq!(title, "Go");
                assert_eq!(slug, "go-lang");
                assert_eq!(content.as_deref(), Some("Go is a language."));
                assert!(content_file.is_none());
                assert_eq!(category.as_deref(), Some("languages"));
                assert!(author.is_none());
                assert!(thumbnail.is_none());
            }
            _ => panic!("Expected CreateArticle command"),
        }
    }

    #[test]
    fn test_cli_content_and_file_conflict() {
        let result = Cli::try_parse_from([
            "wiki-sync",
            "create-article",
            "--title",
            "Go",
            "--slug",
            "go",
            "--content",
            "x",
            "--content-file",
            "body.md",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_search() {
        let cli = Cli::parse_from(["wiki-sync", "search", "community", "rust", "-n", "5", "--type", "post"]);
        match cli.command {
            Commands::Search {
                collection,
                query,
                limit,
                doc_type,
                group_type,
            } => {
                assert_eq!(collection, Collection::Community);
                assert_eq!(query, "rust");
                assert_eq!(limit, 5);
                assert_eq!(doc_type.as_deref(), Some("post"));
                assert!(group_type.is_none());
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_search_rejects_unknown_collection() {
        assert!(Cli::try_parse_from(["wiki-sync", "search", "users", "bob"]).is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["wiki-sync", "stats", "--db-path", "/tmp/wiki", "-l", "debug"]);
        assert!(matches!(cli.command, Commands::Stats));
        let globals = cli.globals();
        assert_eq!(globals.db_path.as_deref(), Some("/tmp/wiki"));
        assert_eq!(globals.log_level.as_deref(), Some("debug"));
        assert!(globals.config.is_none());
    }

    #[test]
    fn test_cli_backlinks_and_reset() {
        let cli = Cli::parse_from(["wiki-sync", "backlinks", "01ABC"]);
        assert!(matches!(cli.command, Commands::Backlinks { ref article_id } if article_id == "01ABC"));

        let cli = Cli::parse_from(["wiki-sync", "reset-index", "comments"]);
        assert!(matches!(cli.command, Commands::ResetIndex { kind: KindArg::Comments }));
    }
}
