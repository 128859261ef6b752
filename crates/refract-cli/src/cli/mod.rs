use clap::Parser;

pub mod root_commands;

pub use root_commands::{CallArgs, Commands, SchemaArgs};

/// Top-level CLI parser for the `rfx` binary.
#[derive(Debug, Parser)]
#[command(name = "rfx", version, about = "Refract - JSON-RPC scene service over stdio")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}
