//! Schema extraction.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use super::common::GlobalArgs;

/// Extract the parameter schema.
#[derive(Args)]
pub struct ExtractArgs {
    /// parameter.hpp, or a plugin directory containing it
    pub source: PathBuf,

    /// Plugin name (default: read from the license header)
    #[arg(short, long)]
    pub plugin: Option<String>,
}

/// Run the extract command.
pub fn run(global: &GlobalArgs, args: ExtractArgs) -> anyhow::Result<()> {
    let pipeline = global.pipeline()?;
    let report = pipeline
        .extract_schema(&args.source, args.plugin.as_deref())
        .with_context(|| format!("failed to extract schema from {}", args.source.display()))?;

    println!(
        "{}: {} parameters, {} bytes per preset",
        report.plugin,
        report.schema.len(),
        report.schema.chunk_size()
    );
    println!("Wrote {}", report.path.display());
    Ok(())
}
