pub type CmdResult<T> = cascade::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod check;
pub mod plan;
pub mod run;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (cascade::Result<serde_json::Value>, i32) {
    crate::tty::status("cascade is working...");

    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Plan(args) => dispatch!(args, global, plan),
        crate::Commands::Check(args) => dispatch!(args, global, check),
    }
}
