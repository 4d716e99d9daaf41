//! List command - show discovered local components

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{inspect_session, print_info};
use crate::GlobalOptions;

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// One listed component
#[derive(Debug, Serialize)]
struct ListedComponent {
    name: String,
    import_path: String,
    markup: Option<PathBuf>,
}

/// Execute the list command
pub async fn execute(args: ListArgs, global: GlobalOptions) -> Result<()> {
    let session = inspect_session(&global).await?;
    let components: Vec<ListedComponent> = session
        .list_local()
        .into_iter()
        .map(|(name, record)| ListedComponent {
            import_path: record.import_path().to_string(),
            markup: record.entry().map(|entry| entry.markup_path.clone()),
            name,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&components)?);
        return Ok(());
    }

    if components.is_empty() {
        print_info("No local components found", global.quiet);
        return Ok(());
    }

    let width = components.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for component in &components {
        println!("{:<width$}  {}", component.name, component.import_path, width = width);
    }

    Ok(())
}
