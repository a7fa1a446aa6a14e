use clap::Args;
use serde::Serialize;

use cascade::config;
use cascade::executor::{self, CancelToken, FailurePolicy, RunReport, RunStatus};
use cascade::jenkins::JenkinsClient;
use cascade::plan::{self, ExecutionPlan};

use super::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Alias to start the chain from
    #[arg(short = 's', long = "start", value_name = "ALIAS")]
    pub start: String,

    /// Aliases to leave out of the plan (repeatable)
    #[arg(short = 'e', long = "exclude", value_name = "ALIAS")]
    pub exclude: Vec<String>,

    /// Keep going when a build fails instead of skipping the rest
    #[arg(long)]
    pub ignore_failed: bool,

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
pub struct RunOutput {
    pub endpoint: String,
    pub plan: ExecutionPlan,
    pub report: RunReport,
}

pub fn run(args: RunArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RunOutput> {
    let config = config::load(&args.config)?;
    let registry = config.registry()?;
    let graph = config.graph(&registry)?;
    let plan = plan::plan(&graph, &registry, &args.start, &args.exclude)?;

    let policy = if args.ignore_failed {
        FailurePolicy::ContinueOnFailure
    } else {
        FailurePolicy::FailFast
    };

    let client = JenkinsClient::from_config(&config)?;
    let cancel = CancelToken::new();
    let report = executor::run(&plan, &client, policy, &cancel);

    let exit_code = match report.status {
        RunStatus::Success => 0,
        RunStatus::Failed | RunStatus::Canceled => 1,
    };

    Ok((
        RunOutput {
            endpoint: config.endpoint.clone(),
            plan,
            report,
        },
        exit_code,
    ))
}
