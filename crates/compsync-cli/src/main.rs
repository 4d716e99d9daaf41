//! compsync CLI - component auto-discovery and generated-artifact sync
//!
//! # Usage
//!
//! ```bash
//! # Discover components and write every enabled artifact
//! compsync sync
//!
//! # Show where a tag resolves to
//! compsync resolve t-button --importer pages/index/index.wxml
//!
//! # List discovered local components
//! compsync list --json
//!
//! # Create a local configuration file
//! compsync config init
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use compsync_config::{ConfigOverrides, LogFormat};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

/// compsync - keep component manifests and declarations in sync
#[derive(Parser, Debug)]
#[command(name = "compsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Project root (defaults to the current directory)
    #[arg(long, short = 'p', global = true, env = "COMPSYNC_PROJECT")]
    project: Option<PathBuf>,

    /// Path to a configuration file, used instead of the global/local merge
    #[arg(long, short = 'c', global = true, env = "COMPSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Override the source root import paths are relative to
    #[arg(long, global = true)]
    source_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            source_root: self.source_root.clone(),
            log_level: if self.verbose {
                Some("debug".to_string())
            } else if self.quiet {
                Some("error".to_string())
            } else {
                None
            },
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover components and write every enabled artifact
    Sync(commands::sync::SyncArgs),

    /// Resolve a tag name the way a template reference would
    Resolve(commands::resolve::ResolveArgs),

    /// List discovered local components
    List(commands::list::ListArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flags win, then RUST_LOG, then the configured level
    let logging = commands::logging_settings(&cli.global);
    let filter = if cli.global.quiet {
        EnvFilter::new("error")
    } else if cli.global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    match logging.format {
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    match cli.command {
        Commands::Sync(args) => commands::sync::execute(args, cli.global).await,
        Commands::Resolve(args) => commands::resolve::execute(args, cli.global).await,
        Commands::List(args) => commands::list::execute(args, cli.global).await,
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global).await,
    }
}
