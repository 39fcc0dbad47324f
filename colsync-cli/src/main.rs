mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colsync_core::SyncType;
use colsync_core::config::ColSyncConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "colsync")]
#[command(about = "Manage the calendars, task lists and memo lists in a DecSync directory")]
struct Cli {
    /// DecSync directory to use instead of the configured one
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the DecSync directory is usable
    Check,
    List {
        /// calendars, tasks, memos or contacts
        sync_type: SyncType,
    },
    Create {
        sync_type: SyncType,
        name: String,
    },
    Rename {
        sync_type: SyncType,
        id: String,
        name: String,
    },
    Delete {
        sync_type: SyncType,
        id: String,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Bind a source file to a collection and sync its color
    Link {
        sync_type: SyncType,

        /// Source file (TOML), created if missing
        source: PathBuf,

        /// Collection id to bind to
        #[arg(short, long)]
        collection: Option<String>,

        /// Create a new collection with this name and bind to it
        #[arg(long, conflicts_with = "collection")]
        new: Option<String>,

        /// Set the source's color (e.g. "#1a73e8")
        #[arg(long)]
        color: Option<String>,

        /// Rename the bound collection
        #[arg(long)]
        rename: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ColSyncConfig::load()?;
    let ctx = commands::Context::new(config, cli.dir);
    tracing::debug!(root = %ctx.root().display(), "using DecSync directory");

    match cli.command {
        Commands::Check => commands::check::run(&ctx),
        Commands::List { sync_type } => commands::list::run(&ctx, sync_type),
        Commands::Create { sync_type, name } => commands::create::run(&ctx, sync_type, &name),
        Commands::Rename {
            sync_type,
            id,
            name,
        } => commands::rename::run(&ctx, sync_type, &id, &name),
        Commands::Delete { sync_type, id, yes } => commands::delete::run(&ctx, sync_type, &id, yes),
        Commands::Link {
            sync_type,
            source,
            collection,
            new,
            color,
            rename,
        } => commands::link::run(
            &ctx,
            sync_type,
            &source,
            commands::link::LinkOptions {
                selection: commands::link::Selection::from_args(collection, new),
                color,
                rename,
            },
        ),
    }
}
