use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agescroll_core::{AppConfig, HttpMediaStore};

mod commands;

#[derive(Parser)]
#[command(name = "agescroll")]
#[command(author, version, about = "An age progression timeline that follows your scrolling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use this config file instead of ~/.config/agescroll/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI
    Run {
        /// Upload these photos after the initial catalog loads
        #[arg(long, value_name = "FILES", num_args = 1..)]
        upload: Vec<PathBuf>,
    },
    /// List the photos in the image store
    List,
    /// Upload photos, then list the store
    Upload {
        /// Image files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Download one photo
    Fetch {
        /// Photo name as listed by `agescroll list`
        id: String,
        /// Output path (defaults to the photo name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

/// Install the tracing subscriber; the TUI logs to a file so it does not draw over the screen
fn init_logging(config: &AppConfig, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if to_file {
        let path = config.log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);
    let command = cli.command.unwrap_or(Commands::Run { upload: Vec::new() });

    // Config commands work even when the existing file does not parse
    if let Commands::Config { action } = &command {
        return match action {
            ConfigAction::Init { force } => commands::config::init(&config_path, *force),
            ConfigAction::Path => commands::config::path(&config_path),
        };
    }

    // Load configuration
    let config = Arc::new(AppConfig::load_from(&config_path)?);

    init_logging(&config, matches!(command, Commands::Run { .. }))?;
    tracing::debug!(config = %config_path.display(), "Configuration loaded");

    match command {
        Commands::Run { upload } => commands::run::run(config, upload).await,
        Commands::List => {
            let store = HttpMediaStore::new(&config.store)?;
            commands::list::run(&store).await
        }
        Commands::Upload { files } => {
            let store = HttpMediaStore::new(&config.store)?;
            commands::upload::run(&store, &files).await
        }
        Commands::Fetch { id, output } => {
            let store = HttpMediaStore::new(&config.store)?;
            commands::fetch::run(&store, &id, output).await
        }
        Commands::Config { .. } => Ok(()),
    }
}
