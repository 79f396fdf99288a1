//! Every stage in sequence.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use super::common::GlobalArgs;

/// Run the whole conversion.
#[derive(Args)]
pub struct RunArgs {
    /// parameter.hpp, or a plugin directory containing it
    pub source: PathBuf,

    /// Directory searched recursively for preset files
    pub preset_dir: PathBuf,

    /// Plugin name (default: read from the license header)
    #[arg(short, long)]
    pub plugin: Option<String>,
}

/// Run the run command.
pub fn run(global: &GlobalArgs, args: RunArgs) -> anyhow::Result<()> {
    let pipeline = global.pipeline()?;
    let plugin = pipeline
        .run(&args.source, &args.preset_dir, args.plugin.as_deref())
        .context("pipeline failed")?;

    println!(
        "{plugin}: artifacts written under {}",
        pipeline.layout().root().display()
    );
    Ok(())
}
