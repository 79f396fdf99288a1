//! Shared CLI options used across every command.

use anyhow::Context;
use clap::Args;
use presetkit_core::{Endianness, Pipeline, ToolConfig};
use std::path::PathBuf;

/// Options accepted before or after any subcommand.
#[derive(Args)]
pub struct GlobalArgs {
    /// Config file (default: ./presetkit.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory for generated artifacts
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Plugin name to class id table (JSON)
    #[arg(long, global = true)]
    pub class_ids: Option<PathBuf>,

    /// Read preset files as big-endian
    #[arg(long, global = true)]
    pub big_endian: bool,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Resolve the config file and apply flag overrides.
    pub fn config(&self) -> anyhow::Result<ToolConfig> {
        let mut config =
            ToolConfig::discover(self.config.as_deref()).context("failed to load config")?;
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }
        if let Some(path) = &self.class_ids {
            config = config.with_class_id_table(path);
        }
        if self.big_endian {
            config = config.with_endianness(Endianness::Big);
        }
        Ok(config)
    }

    /// Build a pipeline from [`GlobalArgs::config`].
    pub fn pipeline(&self) -> anyhow::Result<Pipeline> {
        Ok(Pipeline::new(self.config()?))
    }
}
