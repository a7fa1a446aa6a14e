use std::collections::HashSet;
use std::io::Write;

use cascade::config::{self, Config};
use cascade::executor::{
    self, BuildOutcome, CancelToken, FailurePolicy, JobTrigger, RunStatus, TriggerOutcome,
};
use cascade::plan::{self, ExecutionPlan};
use cascade::ErrorCode;

const CONFIG: &str = r#"
endpoint: https://ci.example.com/
auth:
  username: ci-bot
  api-token: t0ken
aliases:
  - core: platform/core
  - api: platform/api
  - web: platform/web
  - worker: platform/worker
dependencies:
  - web: api
  - api: core
  - worker: core
"#;

struct ScriptedTrigger {
    failing: HashSet<&'static str>,
}

impl ScriptedTrigger {
    fn new(failing: &[&'static str]) -> Self {
        Self {
            failing: failing.iter().copied().collect(),
        }
    }
}

impl JobTrigger for ScriptedTrigger {
    fn trigger(&self, job: &str) -> TriggerOutcome {
        if self.failing.contains(job) {
            TriggerOutcome::failure("build finished with status FAILED")
        } else {
            TriggerOutcome::success().with_build_number(1)
        }
    }
}

fn load_fixture() -> (tempfile::NamedTempFile, Config) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let config = config::load(file.path().to_str().unwrap()).unwrap();
    (file, config)
}

fn plan_from(config: &Config, start: &str, excluded: &[String]) -> ExecutionPlan {
    let registry = config.registry().unwrap();
    let graph = config.graph(&registry).unwrap();
    plan::plan(&graph, &registry, start, excluded).unwrap()
}

#[test]
fn chain_runs_in_dependency_order() {
    let (_file, config) = load_fixture();
    let plan = plan_from(&config, "web", &[]);

    assert_eq!(plan.aliases(), vec!["core", "api", "web"]);
    assert_eq!(plan.builds[0].job, "platform/core");

    let trigger = ScriptedTrigger::new(&[]);
    let report = executor::run(&plan, &trigger, FailurePolicy::FailFast, &CancelToken::new());

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.summary.succeeded, 3);
    assert!(report
        .builds
        .iter()
        .all(|b| b.outcome == BuildOutcome::Success));
}

#[test]
fn excluding_an_alias_prunes_everything_reachable_only_through_it() {
    let (_file, config) = load_fixture();
    let plan = plan_from(&config, "web", &["api".to_string()]);

    assert_eq!(plan.aliases(), vec!["web"]);
}

#[test]
fn start_only_pulls_its_own_dependencies() {
    let (_file, config) = load_fixture();
    let plan = plan_from(&config, "worker", &[]);

    assert_eq!(plan.aliases(), vec!["core", "worker"]);
}

#[test]
fn fail_fast_skips_the_rest_of_the_chain() {
    let (_file, config) = load_fixture();
    let plan = plan_from(&config, "web", &[]);

    let trigger = ScriptedTrigger::new(&["platform/api"]);
    let report = executor::run(&plan, &trigger, FailurePolicy::FailFast, &CancelToken::new());

    assert_eq!(report.status, RunStatus::Failed);
    let outcomes: Vec<(&str, BuildOutcome)> = report
        .builds
        .iter()
        .map(|b| (b.alias.as_str(), b.outcome))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("core", BuildOutcome::Success),
            ("api", BuildOutcome::Failure),
            ("web", BuildOutcome::Skipped),
        ]
    );
    assert!(report.has_failures());
}

#[test]
fn ignore_failed_policy_attempts_the_whole_chain() {
    let (_file, config) = load_fixture();
    let plan = plan_from(&config, "web", &[]);

    let trigger = ScriptedTrigger::new(&["platform/api"]);
    let report = executor::run(
        &plan,
        &trigger,
        FailurePolicy::ContinueOnFailure,
        &CancelToken::new(),
    );

    assert_eq!(report.status, RunStatus::Failed);
    let outcomes: Vec<(&str, BuildOutcome)> = report
        .builds
        .iter()
        .map(|b| (b.alias.as_str(), b.outcome))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("core", BuildOutcome::Success),
            ("api", BuildOutcome::Failure),
            ("web", BuildOutcome::Success),
        ]
    );
}

#[test]
fn unknown_start_alias_fails_before_any_trigger() {
    let (_file, config) = load_fixture();
    let registry = config.registry().unwrap();
    let graph = config.graph(&registry).unwrap();

    let err = plan::plan(&graph, &registry, "webapp", &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::StartNotFound);
}

#[test]
fn cyclic_configuration_is_rejected_at_graph_construction() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"
endpoint: https://ci.example.com
auth:
  username: ci-bot
  api-token: t0ken
aliases:
  - a: jobs/a
  - b: jobs/b
dependencies:
  - a: b
  - b: a
"#,
    )
    .unwrap();

    let config = config::load(file.path().to_str().unwrap()).unwrap();
    let registry = config.registry().unwrap();
    let err = config.graph(&registry).unwrap_err();

    assert_eq!(err.code, ErrorCode::GraphCyclic);
    assert!(err.message.contains("a -> b -> a") || err.message.contains("b -> a -> b"));
}
