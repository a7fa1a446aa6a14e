use clap::Args;
use serde::Serialize;

use cascade::config;
use cascade::plan::{self, ExecutionPlan};

use super::CmdResult;

#[derive(Args)]
pub struct PlanArgs {
    /// Alias to start the chain from
    #[arg(short = 's', long = "start", value_name = "ALIAS")]
    pub start: String,

    /// Aliases to leave out of the plan (repeatable)
    #[arg(short = 'e', long = "exclude", value_name = "ALIAS")]
    pub exclude: Vec<String>,

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
pub struct PlanOutput {
    pub endpoint: String,
    #[serde(flatten)]
    pub plan: ExecutionPlan,
}

pub fn run(args: PlanArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<PlanOutput> {
    let config = config::load(&args.config)?;
    let registry = config.registry()?;
    let graph = config.graph(&registry)?;
    let plan = plan::plan(&graph, &registry, &args.start, &args.exclude)?;

    Ok((
        PlanOutput {
            endpoint: config.endpoint.clone(),
            plan,
        },
        0,
    ))
}
