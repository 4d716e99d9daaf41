//! Config command - View and manage configuration
//!
//! - Show the effective (merged) configuration
//! - Show configuration file paths
//! - Create a local configuration file with defaults

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use compsync_config::ConfigLoader;
use serde::Serialize;

use super::{load_config, print_info, resolve_project};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Show configuration file paths
    Path(PathArgs),

    /// Create `.compsync/config.toml` with default values
    Init,
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON instead of TOML
    #[arg(long)]
    json: bool,
}

/// Arguments for the path command
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Whether global config exists
    pub global_exists: bool,
    /// Whether local config exists
    pub local_exists: bool,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, global),
        ConfigCommand::Path(args) => execute_path(args, global),
        ConfigCommand::Init => execute_init(global),
    }
}

fn execute_show(args: ShowArgs, global: GlobalOptions) -> Result<()> {
    let project = resolve_project(&global)?;
    let config = load_config(&global, &project)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let text = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
        print!("{}", text);
    }

    Ok(())
}

fn execute_path(args: PathArgs, global: GlobalOptions) -> Result<()> {
    let project = resolve_project(&global)?;
    let loader = ConfigLoader::new();

    let global_path = loader.global_config_path();
    let local_path = loader.local_config_path(&project);

    let paths = ConfigPaths {
        global: global_path.clone(),
        local: local_path.clone(),
        global_exists: global_path.as_ref().map(|p| p.exists()).unwrap_or(false),
        local_exists: local_path.exists(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
    } else {
        if let Some(ref gp) = paths.global {
            let status = if paths.global_exists {
                "exists"
            } else {
                "not found"
            };
            println!("Global: {} ({})", gp.display(), status);
        } else {
            println!("Global: not available (no home directory)");
        }

        let status = if paths.local_exists {
            "exists"
        } else {
            "not found"
        };
        println!("Local:  {} ({})", paths.local.display(), status);
    }

    Ok(())
}

fn execute_init(global: GlobalOptions) -> Result<()> {
    let project = resolve_project(&global)?;
    let loader = ConfigLoader::new();
    let existed = loader.local_config_path(&project).exists();

    let path = loader
        .init_local(&project)
        .context("Failed to create local configuration")?;

    if existed {
        print_info(
            &format!("Configuration already exists at {}", path.display()),
            global.quiet,
        );
    } else {
        println!("Created {}", path.display());
    }

    Ok(())
}
