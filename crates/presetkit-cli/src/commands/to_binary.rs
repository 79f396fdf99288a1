//! Preset JSON to binary presets.

use anyhow::Context;
use clap::Args;

use super::common::GlobalArgs;

/// Encode the preset JSON into preset files.
#[derive(Args)]
pub struct ToBinaryArgs {
    /// Plugin name
    pub plugin: String,
}

/// Run the to-binary command.
pub fn run(global: &GlobalArgs, args: ToBinaryArgs) -> anyhow::Result<()> {
    let pipeline = global.pipeline()?;
    let written = pipeline
        .json_to_binary(&args.plugin)
        .with_context(|| format!("failed to encode presets for {}", args.plugin))?;

    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
