//! # antiplag CLI
//!
//! ## Usage
//!
//! ```bash
//! antiplag --config ./config/antiplag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `antiplag init` | Create the database, tables, and storage directories |
//! | `antiplag upload <path>` | Store a `.txt` file (dedups identical content) |
//! | `antiplag get <id>` | Write a stored document to stdout |
//! | `antiplag duplicate <id>` | Show the byte-identical document, if any |
//! | `antiplag analyze <id>` | Show (and cache) paragraph/word/character counts |
//! | `antiplag stats` | Summarize the catalog and analysis cache |
//! | `antiplag serve <storage\|analysis\|all>` | Start the HTTP server |
//!
//! Logs go to stderr and are filtered with `RUST_LOG`
//! (default `antiplag=info`, or `antiplag=debug` with `--verbose`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use antiplag::server::ServeMode;
use antiplag::{cli, config, migrate, server, stats};

/// antiplag: text-document storage and analysis with exact-duplicate
/// detection.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/antiplag.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "antiplag",
    about = "Text-document storage and analysis with exact-duplicate detection",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/antiplag.toml")]
    config: PathBuf,

    /// Log at debug level unless `RUST_LOG` is set.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema and storage directories.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Store a text file.
    ///
    /// Prints the document id and whether the content was new or already
    /// stored under that id.
    Upload {
        /// File to upload.
        path: PathBuf,

        /// Name to record instead of the file's own name.
        #[arg(long)]
        name: Option<String>,
    },

    /// Write a stored document's content to stdout.
    Get {
        /// Document id.
        id: i64,
    },

    /// Find an earlier or later document with byte-identical content.
    Duplicate {
        /// Document id.
        id: i64,
    },

    /// Analyze a document.
    ///
    /// The first call computes and stores the result; later calls return
    /// the stored result unchanged.
    Analyze {
        /// Document id.
        id: i64,

        /// Print the record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show catalog and analysis statistics.
    Stats,

    /// Start an HTTP server on `[server].bind`.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Storage service: upload, fetch, duplicate query.
    Storage,
    /// Analysis service: analysis and word-cloud artifacts.
    Analysis,
    /// Both services in one process.
    All,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "antiplag=debug,antiplag_core=debug"
    } else {
        "antiplag=info,antiplag_core=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let cfg = config::load_config(&args.config)?;

    match args.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Upload { path, name } => {
            cli::run_upload(&cfg, &path, name.as_deref()).await?;
        }
        Commands::Get { id } => {
            cli::run_get(&cfg, id).await?;
        }
        Commands::Duplicate { id } => {
            cli::run_duplicate(&cfg, id).await?;
        }
        Commands::Analyze { id, json } => {
            cli::run_analyze(&cfg, id, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve { service } => {
            let mode = match service {
                ServeService::Storage => ServeMode::Storage,
                ServeService::Analysis => ServeMode::Analysis,
                ServeService::All => ServeMode::All,
            };
            server::run_server(&cfg, mode).await?;
        }
    }

    Ok(())
}
