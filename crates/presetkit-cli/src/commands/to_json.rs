//! Binary presets to the preset JSON.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use super::common::GlobalArgs;

/// Decode a directory of preset files.
#[derive(Args)]
pub struct ToJsonArgs {
    /// Plugin name
    pub plugin: String,

    /// Directory searched recursively for preset files
    pub preset_dir: PathBuf,
}

/// Run the to-json command.
pub fn run(global: &GlobalArgs, args: ToJsonArgs) -> anyhow::Result<()> {
    let pipeline = global.pipeline()?;
    let presets = pipeline
        .binary_to_json(&args.plugin, &args.preset_dir)
        .with_context(|| format!("failed to convert presets for {}", args.plugin))?;

    println!(
        "Decoded {} presets from {}",
        presets.len(),
        args.preset_dir.display()
    );
    println!(
        "Wrote {}",
        pipeline.layout().preset_json(&args.plugin).display()
    );
    Ok(())
}
