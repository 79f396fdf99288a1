//! presetkit - convert plugin presets between `.vstpreset`, JSON, and C++.

mod commands;

use clap::{Parser, Subcommand};
use commands::common::GlobalArgs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "presetkit")]
#[command(author, version, about = "VST3 preset interchange toolchain", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the parameter schema from parameter.hpp
    Extract(commands::extract::ExtractArgs),

    /// Decode a directory of preset files into the preset JSON
    ToJson(commands::to_json::ToJsonArgs),

    /// Encode the preset JSON into preset files
    ToBinary(commands::to_binary::ToBinaryArgs),

    /// Generate C++ preset loader and name table
    Codegen(commands::codegen::CodegenArgs),

    /// Run extract, to-json, to-binary, and codegen in order
    Run(commands::run::RunArgs),

    /// Show the header and chunk list of a preset file
    Inspect(commands::inspect::InspectArgs),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match cli.command {
        Commands::Extract(args) => commands::extract::run(&cli.global, args),
        Commands::ToJson(args) => commands::to_json::run(&cli.global, args),
        Commands::ToBinary(args) => commands::to_binary::run(&cli.global, args),
        Commands::Codegen(args) => commands::codegen::run(&cli.global, args),
        Commands::Run(args) => commands::run::run(&cli.global, args),
        Commands::Inspect(args) => commands::inspect::run(&cli.global, args),
    }
}
