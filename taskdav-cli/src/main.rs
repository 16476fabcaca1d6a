mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use taskdav_core::SyncConfig;

#[derive(Parser)]
#[command(name = "taskdav")]
#[command(about = "Translate local tasks to and from CalDAV VTODO objects")]
struct Cli {
    /// Config file to use instead of ~/.config/taskdav/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task to the local store
    New {
        title: String,

        /// Due date (e.g., "2025-03-20" or "2025-03-20T15:00")
        #[arg(short, long)]
        due: Option<String>,

        /// high, medium, low or none
        #[arg(short, long)]
        priority: Option<String>,
    },
    /// Write a local task as a VTODO
    Push {
        /// Remote calendar id
        #[arg(short, long)]
        calendar: String,

        /// Local task id
        #[arg(short, long)]
        task: i64,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Apply a VTODO file to the local store
    Pull {
        /// Remote calendar id
        #[arg(short, long)]
        calendar: String,

        file: PathBuf,

        /// ETag the server returned for the object
        #[arg(long)]
        etag: Option<String>,

        /// Object name on the server (defaults to the file name)
        #[arg(long)]
        object: Option<String>,
    },
    /// List tasks in the local store
    Tasks,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("taskdav_core=info".parse()?)
                .add_directive("taskdav=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SyncConfig::load_from(path)?,
        None => SyncConfig::load()?,
    };

    match cli.command {
        Commands::New {
            title,
            due,
            priority,
        } => commands::new::run(&config, &title, due.as_deref(), priority.as_deref()).await,
        Commands::Push {
            calendar,
            task,
            out,
        } => commands::push::run(&config, &calendar, task, out.as_deref()).await,
        Commands::Pull {
            calendar,
            file,
            etag,
            object,
        } => {
            commands::pull::run(&config, &calendar, &file, etag.as_deref(), object.as_deref()).await
        }
        Commands::Tasks => commands::tasks::run(&config).await,
    }
}
