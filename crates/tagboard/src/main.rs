//! CLI entry point for tagboard.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tagboard_app::{ProjectConfig, Repository};
use tagboard_store_fs::FsStore;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Kanban board over tasks written inside markdown and source comments.
#[derive(Parser, Debug)]
#[command(
    name = "tagboard",
    version,
    about = "tagboard: a kanban board over #TODO-style tags in your files"
)]
struct Cli {
    /// Board root directory (defaults to current).
    #[arg(long)]
    root: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks grouped by list.
    Ls {
        /// Filter query, e.g. `+urgent owner:kim list:TODO`.
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },

    /// Add a task line to a file.
    Add {
        /// Task text.
        text: String,
        /// Target list (defaults to the first list).
        #[arg(short = 'l', long)]
        list: Option<String>,
        /// Target file (defaults to `cards.default_file`).
        #[arg(short = 'f', long)]
        file: Option<String>,
    },

    /// Move tasks, given as `path:line`, into a list.
    Mv {
        /// Destination list.
        list: String,
        /// Tasks to move, in order.
        #[arg(required = true)]
        tasks: Vec<String>,
        /// Zero-based rank in the destination (defaults to the end).
        #[arg(long)]
        pos: Option<usize>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LsFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let Cli { root, cmd } = Cli::parse();
    install_tracing();

    let root = root.unwrap_or_else(|| ".".to_owned());
    let config = ProjectConfig::from_workdir(&root)?;
    let mut repo = Repository::open(FsStore::open(&root)?, config)?;
    let stdout = std::io::stdout();
    commands::run(cmd, &mut repo, &mut stdout.lock())
}

fn install_tracing() {
    // RUST_LOG is honoured; the default level is INFO.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
