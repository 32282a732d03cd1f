//! ewskit command line tool
//!
//! Inspects recorded responses without touching a server:
//!   ewskit classify response.xml
//!   ewskit extract --kind calendar response.xml
//!   ewskit page --kind calendar page1.xml page2.xml
//!   ewskit sync --kind calendar --watermark H4sI... batch1.xml batch2.xml
//!   ewskit notification push.xml
//!
//! Output is JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ewskit_cli::{Kind, ReplayTransport};
use ewskit_sync::Detail;
use ewskit_types::FolderRef;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ewskit")]
#[command(about = "Inspect and replay recorded mailbox service responses")]
struct Args {
    /// Client configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify the status codes of a response
    Classify { file: PathBuf },

    /// Extract every entity of a kind from a response
    Extract {
        #[arg(short, long, value_enum)]
        kind: Kind,
        file: PathBuf,
    },

    /// Replay recorded listing pages through the pager
    Page {
        #[arg(short, long, value_enum)]
        kind: Kind,
        /// Folder id or distinguished name
        #[arg(short, long, default_value = "calendar")]
        folder: String,
        #[arg(short, long, value_enum, default_value = "id-only")]
        detail: DetailArg,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Replay recorded sync batches
    Sync {
        #[arg(short, long, value_enum)]
        kind: Kind,
        #[arg(short, long, default_value = "calendar")]
        folder: String,
        /// Watermark to resume from; omit for a full resync
        #[arg(short, long)]
        watermark: Option<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Parse a push notification
    Notification { file: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DetailArg {
    IdOnly,
    Summary,
    Full,
}

impl From<DetailArg> for Detail {
    fn from(arg: DetailArg) -> Self {
        match arg {
            DetailArg::IdOnly => Detail::IdOnly,
            DetailArg::Summary => Detail::Summary,
            DetailArg::Full => Detail::Full,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = ewskit_cli::load_config(args.config.as_deref())?;
    let namespaces = config.namespaces.clone();

    match args.command {
        Command::Classify { file } => {
            let document = ewskit_cli::load_document(&file)?;
            print_json(&ewskit_cli::classify(&document, &namespaces)?)
        }
        Command::Extract { kind, file } => {
            let document = ewskit_cli::load_document(&file)?;
            let views = ewskit_cli::extract(kind, &document, &namespaces)?;
            info!("extracted {} entities from {}", views.len(), file.display());
            print_json(&views)
        }
        Command::Page {
            kind,
            folder,
            detail,
            files,
        } => {
            let transport = ReplayTransport::from_files(&files)?;
            let summary = ewskit_cli::replay_listing(
                kind,
                parse_folder(&folder)?,
                detail.into(),
                transport,
                config,
            )
            .await?;
            print_json(&summary)
        }
        Command::Sync {
            kind,
            folder,
            watermark,
            files,
        } => {
            let transport = ReplayTransport::from_files(&files)?;
            let summary = ewskit_cli::replay_sync(
                kind,
                parse_folder(&folder)?,
                watermark,
                transport,
                config,
            )
            .await?;
            print_json(&summary)
        }
        Command::Notification { file } => {
            let document = ewskit_cli::load_document(&file)?;
            print_json(&ewskit_cli::notification(&document, &namespaces)?)
        }
    }
}

fn parse_folder(folder: &str) -> Result<FolderRef> {
    FolderRef::parse(folder).with_context(|| format!("invalid folder: {folder:?}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
