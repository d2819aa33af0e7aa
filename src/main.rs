//! topicline - Bookmark line ranges in text documents
//!
//! topicline provides:
//! - Anchored topics that follow their lines through edits
//! - A bounded, ordered topic list persisted under .topicline/
//! - Reconciliation on demand or from a file watcher
//! - Unified output format (jsonl/json/md/raw)

use anyhow::Result;
use clap::Parser;
use env_logger::{Env, Target};

mod anchors;
mod cli;
mod core;
mod host;
mod sync;
mod topics;

fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    cli::run(cli)
}
