//! Resolve command - show where a tag name resolves to

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use compsync_config::resolve_against;
use serde::Serialize;

use super::{inspect_session, resolve_project};
use crate::GlobalOptions;

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Tag name as written in a template
    tag: String,

    /// File the reference appears in (relative to the project root)
    #[arg(long)]
    importer: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Resolution<'a> {
    tag: &'a str,
    kind: &'static str,
    import_path: &'a str,
}

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, global: GlobalOptions) -> Result<()> {
    let project = resolve_project(&global)?;
    let importer = match args.importer {
        Some(ref path) => resolve_against(&project, path),
        None => project.clone(),
    };

    let session = inspect_session(&global).await?;
    let Some(record) = session.resolve(&args.tag, &importer) else {
        anyhow::bail!("Tag '{}' is not a known component", args.tag);
    };

    let resolution = Resolution {
        tag: &args.tag,
        kind: if record.is_local() { "local" } else { "external" },
        import_path: record.import_path(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        println!("{} ({})", resolution.import_path, resolution.kind);
    }

    Ok(())
}
