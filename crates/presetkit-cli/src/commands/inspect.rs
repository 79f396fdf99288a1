//! Display preset file structure.

use anyhow::Context;
use clap::Args;
use presetkit_core::BinaryContainer;
use std::path::PathBuf;

use super::common::GlobalArgs;

/// Display the header and chunk list of a preset file.
#[derive(Args)]
pub struct InspectArgs {
    /// Path to the preset file
    pub file: PathBuf,

    /// Also decode parameter values with this plugin's extracted schema
    #[arg(short, long)]
    pub plugin: Option<String>,
}

/// Run the inspect command.
pub fn run(global: &GlobalArgs, args: InspectArgs) -> anyhow::Result<()> {
    let config = global.config()?;
    let bytes =
        std::fs::read(&args.file).with_context(|| format!("failed to read {}", args.file.display()))?;
    let container = BinaryContainer::decode(&bytes, config.endianness)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    println!("File: {} ({} bytes)", args.file.display(), bytes.len());
    print!("{}", container.summary());

    if let Some(plugin) = &args.plugin {
        let pipeline = presetkit_core::Pipeline::new(config.clone());
        let schema = pipeline.load_schema(plugin)?;
        let comp = container
            .component_chunk()
            .context("file has no Comp section")?;
        let values = presetkit_core::unpack(comp, &schema, config.endianness)?;
        println!();
        for (name, value) in values.iter() {
            println!("{name:<24} {value}");
        }
    }
    Ok(())
}
