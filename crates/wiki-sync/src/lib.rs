//! wiki-sync library exports.
//!
//! - `cli`: command-line argument parsing with clap
//! - `commands`: command implementations (reconcile, create-article, backlinks, stats, search)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, GlobalOptions, KindArg};
pub use commands::{
    backlinks, create_article, init_logging, load_settings, print_hits, print_reconcile_report,
    print_stats, reconcile, reset_index, search, stats, NewArticle,
};
