//! Sync command - discover components and write every enabled artifact

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use compsync_config::ConfigOverrides;
use compsync_core::ArtifactKind;
use serde::Serialize;

use super::{build_session, load_config, print_info, resolve_project};
use crate::GlobalOptions;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Also write the typed-declaration artifact
    #[arg(long)]
    typed: bool,

    /// Also write the framework-declaration artifact
    #[arg(long)]
    framework: bool,

    /// Also write the editor-schema artifact
    #[arg(long)]
    editor_schema: bool,

    /// Output a JSON summary
    #[arg(long)]
    json: bool,
}

/// Outcome of one artifact after the sync settled
#[derive(Debug, Serialize)]
struct ArtifactSummary {
    artifact: &'static str,
    path: Option<PathBuf>,
    written: bool,
}

/// Summary printed with `--json`
#[derive(Debug, Serialize)]
struct SyncSummary {
    components: usize,
    artifacts: Vec<ArtifactSummary>,
}

/// Execute the sync command
pub async fn execute(args: SyncArgs, global: GlobalOptions) -> Result<()> {
    let project = resolve_project(&global)?;
    let mut config = load_config(&global, &project)?;
    config.apply_overrides(&ConfigOverrides {
        typed: args.typed.then_some(true),
        framework: args.framework.then_some(true),
        editor_schema: args.editor_schema.then_some(true),
        ..Default::default()
    });

    let session = build_session(&project, config)?;
    let components = session.scan().await;
    session.flush().await;

    let summary = SyncSummary {
        components,
        artifacts: ArtifactKind::ALL
            .iter()
            .map(|kind| ArtifactSummary {
                artifact: kind.label(),
                path: session.output_path(*kind),
                written: session.write_count(*kind) > 0,
            })
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_info(
        &format!("Discovered {} local component(s)", summary.components),
        global.quiet,
    );
    for artifact in &summary.artifacts {
        let Some(ref path) = artifact.path else {
            continue;
        };
        let status = if artifact.written { "written" } else { "unchanged" };
        let shown = path.strip_prefix(&project).unwrap_or(path.as_path());
        println!("{:<22} {} ({})", artifact.artifact, shown.display(), status);
    }

    Ok(())
}
