use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Serve newline-delimited JSON-RPC on stdin/stdout until EOF.
    Serve,
    /// Dispatch a single request and print every outgoing message.
    Call(CallArgs),
    /// Print an endpoint schema, or the endpoint list.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct CallArgs {
    /// Method name.
    pub method: String,

    /// Params as a JSON document.
    pub params: Option<String>,

    /// File streamed as binary chunks to the upload named by the params' `chunks_id`.
    #[arg(long)]
    pub upload: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Endpoint to describe. Lists every endpoint when omitted.
    pub endpoint: Option<String>,
}
