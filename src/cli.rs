//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::render::{OutputFormat, RenderConfig};

/// topicline - bookmark line ranges in text documents and keep them in place as files change.
#[derive(Parser, Debug)]
#[command(name = "topicline")]
#[command(
    author,
    version,
    about,
    long_about = r#"topicline keeps an ordered list of up to 20 bookmarked line ranges ("topics").

Each topic is pinned by an anchor (` ^topic-xxxxxxxx`) appended to its first
line, so it can be found again after the document is edited.

Every command prints a ResultSet in the selected format (default: jsonl).

Output formats:
- jsonl: one JSON object per line (best for piping into tools)
- json: a single JSON array
- md: human-friendly Markdown
- raw: excerpts only

Line numbers on the command line are 1-based and inclusive.

Examples:
    topicline register notes/today.md --lines 12:15
    topicline list --format md
    topicline jump 3
    topicline sync
"#
)]
pub struct Cli {
    /// Root directory holding the documents and the .topicline state.
    #[arg(
        long,
        global = true,
        default_value = ".",
        value_name = "ROOT",
        env = "TOPICLINE_ROOT",
        long_help = "Root directory for all operations (defaults to the current directory).\n\n\
Document paths are stored and emitted relative to this root. State is kept in\n\
ROOT/.topicline/data.json."
    )]
    pub root: PathBuf,

    /// Output format (jsonl/json/md/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format for ResultSet.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)\n\
- raw"
    )]
    pub format: String,

    /// Quiet mode (errors only on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Only log errors to stderr. Results are still printed to stdout."
    )]
    pub quiet: bool,

    /// Verbose mode (more diagnostics).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Log debug diagnostics to stderr. RUST_LOG takes precedence when set."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(
        long,
        global = true,
        long_help = "Pretty-print JSON and JSONL output with indentation for human readability.\n\n\
Has no effect on md/raw formats."
    )]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a line range as a topic.
    #[command(
        long_about = "Append an anchor to the first line of the range and add the range to the\n\
topic list.\n\n\
Rejected (as an error item) when the list already holds 20 topics, the range does\n\
not fit the document, or the first line already anchors a topic.\n\n\
Examples:\n\
  topicline register notes/a.md --lines 3:5\n\
  topicline register notes/a.md --lines 7\n"
    )]
    Register {
        /// Document path (relative to ROOT).
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Line range START:END or a single line N (1-based).
        #[arg(long, value_name = "RANGE")]
        lines: String,
    },

    /// Remove every topic overlapping a line range.
    #[command(
        long_about = "Reconcile the document, then remove all topics whose range overlaps the\n\
given lines and strip their anchors.\n\n\
Example:\n\
  topicline unregister notes/a.md --lines 3:5\n"
    )]
    Unregister {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long, value_name = "RANGE")]
        lines: String,
    },

    /// Unregister if any topic overlaps the range, register otherwise.
    Toggle {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long, value_name = "RANGE")]
        lines: String,
    },

    /// List topics in order with their current status.
    #[command(
        long_about = "Emit every topic in list order. Positions are derived from the current\n\
document text without saving.\n\n\
Status values:\n\
- ok: anchor found\n\
- stale: anchor missing, last-known position shown\n\
- missing: document not found\n"
    )]
    List,

    /// Show the topic at a 1-based position and where it is now.
    Jump {
        #[arg(value_name = "N")]
        position: usize,
    },

    /// Move the topic at FROM to position TO (1-based).
    #[command(long_about = "Move a topic within the list. TO is counted after removal, so\n\
`reorder 1 3` on [A,B,C,D] gives [B,C,A,D].\n")]
    Reorder {
        #[arg(value_name = "FROM")]
        from: usize,

        #[arg(value_name = "TO")]
        to: usize,
    },

    /// Remove all topics and strip their anchors.
    Clear,

    /// Reconcile topics with the current document text and save changes.
    #[command(long_about = "Run a reconciliation pass now for FILE, or for every document\n\
that has topics, and emit one sync item per document.\n")]
    Sync {
        /// Only reconcile this document.
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Move a document and carry its topics along.
    Mv {
        #[arg(value_name = "OLD")]
        old: PathBuf,

        #[arg(value_name = "NEW")]
        new: PathBuf,
    },

    /// Show or change persisted settings.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Watch ROOT and keep topics in place as documents change (requires 'watch' feature)
    #[cfg(feature = "watch")]
    Watch {
        /// Quiet period before a modified document is reconciled.
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print all settings.
    Show,

    /// Set a setting.
    #[command(long_about = "Set a persisted setting.\n\n\
Settings:\n\
- debounce-ms: quiet period before a modified document is reconciled (default 300)\n\n\
Example:\n\
  topicline config set debounce-ms 500\n")]
    Set {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "VALUE")]
        value: String,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let root = cli.root.canonicalize().unwrap_or(cli.root);

    match cli.command {
        Commands::Register { file, lines } => {
            crate::topics::api::run_register(&root, &file, &lines, render_config)
        }

        Commands::Unregister { file, lines } => {
            crate::topics::api::run_unregister(&root, &file, &lines, render_config)
        }

        Commands::Toggle { file, lines } => {
            crate::topics::api::run_toggle(&root, &file, &lines, render_config)
        }

        Commands::List => crate::topics::api::run_list(&root, render_config),

        Commands::Jump { position } => crate::topics::api::run_jump(&root, position, render_config),

        Commands::Reorder { from, to } => {
            crate::topics::api::run_reorder(&root, from, to, render_config)
        }

        Commands::Clear => crate::topics::api::run_clear(&root, render_config),

        Commands::Sync { file } => crate::sync::api::run_sync(&root, file.as_deref(), render_config),

        Commands::Mv { old, new } => crate::sync::api::run_mv(&root, &old, &new, render_config),

        Commands::Config { action } => match action {
            ConfigCommands::Show => crate::topics::api::run_config_show(&root, render_config),
            ConfigCommands::Set { name, value } => {
                crate::topics::api::run_config_set(&root, &name, &value, render_config)
            }
        },

        #[cfg(feature = "watch")]
        Commands::Watch { debounce_ms } => {
            let window = crate::sync::api::window_for(&root, debounce_ms);
            let renderer = crate::core::render::Renderer::with_config(render_config);
            crate::sync::watch::run_watch(&root, window, &renderer)
        }
    }
}
