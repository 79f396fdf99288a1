//! Preset JSON to C++ sources.

use anyhow::Context;
use clap::Args;

use super::common::GlobalArgs;

/// Generate the preset loader and name table.
#[derive(Args)]
pub struct CodegenArgs {
    /// Plugin name
    pub plugin: String,
}

/// Run the codegen command.
pub fn run(global: &GlobalArgs, args: CodegenArgs) -> anyhow::Result<()> {
    let pipeline = global.pipeline()?;
    let generated = pipeline
        .json_to_code(&args.plugin)
        .with_context(|| format!("failed to generate sources for {}", args.plugin))?;

    let layout = pipeline.layout();
    println!("Generated {} presets", generated.identifiers.len());
    println!("Wrote {}", layout.loader_source(&args.plugin).display());
    println!("Wrote {}", layout.table_source(&args.plugin).display());
    Ok(())
}
