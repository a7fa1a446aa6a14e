use clap::Args;
use serde::Serialize;

use cascade::config;
use cascade::registry::AliasEntry;

use super::CmdResult;

#[derive(Args)]
pub struct CheckArgs {
    /// Path to the YAML configuration file
    #[arg(
        short = 'f',
        long = "config",
        value_name = "PATH",
        default_value = config::DEFAULT_CONFIG_PATH
    )]
    pub config: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutput {
    pub path: String,
    pub endpoint: String,
    pub aliases: Vec<AliasEntry>,
    pub edge_count: usize,
}

/// Loads the configuration and walks it through the same validation a run
/// would: alias registration, edge declaration, and cycle detection.
pub fn run(args: CheckArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<CheckOutput> {
    let config = config::load(&args.config)?;
    let registry = config.registry()?;
    let graph = config.graph(&registry)?;

    Ok((
        CheckOutput {
            path: config.path.clone(),
            endpoint: config.endpoint.clone(),
            aliases: registry.entries().to_vec(),
            edge_count: graph.edge_count(),
        },
        0,
    ))
}
