use anyhow::Context;
use refract_config::RefractConfig;
use refract_core::{stringify, stringify_pretty};

use crate::cli::SchemaArgs;
use crate::scene;

/// Handle `rfx schema`.
pub fn handle(args: &SchemaArgs, config: &RefractConfig) -> anyhow::Result<()> {
    let dispatcher = scene::dispatcher();
    let endpoints = dispatcher.endpoints();
    let document = match &args.endpoint {
        Some(name) => endpoints
            .get(name)
            .with_context(|| format!("unknown endpoint '{name}'"))?
            .to_json()?,
        None => endpoints.list(),
    };

    let rendered = if config.rpc.pretty_schemas {
        stringify_pretty(&document)?
    } else {
        stringify(&document)
    };
    println!("{rendered}");
    Ok(())
}
