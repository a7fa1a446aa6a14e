use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::log_status;
use crate::plan::{ExecutionPlan, PlannedBuild};

/// Outcome recorded for one alias in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    Success,
    Failure,
    Skipped,
}

/// How the run reacts to a failed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    FailFast,
    ContinueOnFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerStatus {
    Success,
    Failure,
}

/// Terminal result reported by the trigger capability for one job, plus
/// whatever metadata the remote side exposed along the way.
#[derive(Debug, Clone)]
pub struct TriggerOutcome {
    pub status: TriggerStatus,
    pub build_number: Option<i64>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

impl TriggerOutcome {
    pub fn success() -> Self {
        Self {
            status: TriggerStatus::Success,
            build_number: None,
            duration_ms: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: TriggerStatus::Failure,
            build_number: None,
            duration_ms: None,
            error: Some(error.into()),
        }
    }

    pub fn with_build_number(mut self, build_number: i64) -> Self {
        self.build_number = Some(build_number);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Blocking trigger capability: start the remote job and return only once a
/// terminal status is known. Retries, backoff, and status polling are the
/// implementation's own concern. Faults surface as Failure outcomes, never
/// as errors — "job failed" and "could not reach the server" are the same
/// thing at this layer.
pub trait JobTrigger {
    fn trigger(&self, job: &str) -> TriggerOutcome;
}

/// Cooperative cancellation flag. The executor checks it before each trigger
/// call; once raised, the rest of the plan is marked skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    pub alias: String,
    pub job: String,
    pub outcome: BuildOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildRecord {
    fn attempted(planned: &PlannedBuild, outcome: TriggerOutcome) -> Self {
        let (recorded, error) = match outcome.status {
            TriggerStatus::Success => (BuildOutcome::Success, None),
            TriggerStatus::Failure => (BuildOutcome::Failure, outcome.error),
        };

        Self {
            alias: planned.alias.clone(),
            job: planned.job.clone(),
            outcome: recorded,
            build_number: outcome.build_number,
            duration_ms: outcome.duration_ms,
            error,
        }
    }

    fn skipped(planned: &PlannedBuild) -> Self {
        Self {
            alias: planned.alias.clone(),
            job: planned.job.clone(),
            outcome: BuildOutcome::Skipped,
            build_number: None,
            duration_ms: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Final ordered record of one run, the only artifact that survives it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub status: RunStatus,
    pub policy: FailurePolicy,
    pub builds: Vec<BuildRecord>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Walk the plan strictly in order, one trigger call at a time; alias N+1
/// never starts before alias N's terminal outcome is known. Per-build
/// failures become report entries, never errors — the failure policy decides
/// whether a failure stops the run.
pub fn run(
    plan: &ExecutionPlan,
    trigger: &dyn JobTrigger,
    policy: FailurePolicy,
    cancel: &CancelToken,
) -> RunReport {
    let total = plan.len();
    let mut builds: Vec<BuildRecord> = Vec::with_capacity(total);
    let mut canceled = false;

    if plan.is_empty() {
        log_status!("run", "Nothing to build");
    }

    for (position, planned) in plan.builds.iter().enumerate() {
        if cancel.is_canceled() {
            canceled = true;
            log_status!(
                "run",
                "Cancellation requested, skipping {} remaining builds",
                total - position
            );
            for rest in &plan.builds[position..] {
                builds.push(BuildRecord::skipped(rest));
            }
            break;
        }

        log_status!(
            "run",
            "Triggering '{}' ({}) [{}/{}]",
            planned.alias,
            planned.job,
            position + 1,
            total
        );
        let outcome = trigger.trigger(&planned.job);
        let record = BuildRecord::attempted(planned, outcome);

        match record.outcome {
            BuildOutcome::Success => {
                log_status!("run", "'{}' succeeded", planned.alias);
                builds.push(record);
            }
            _ => {
                log_status!(
                    "run",
                    "'{}' failed: {}",
                    planned.alias,
                    record.error.as_deref().unwrap_or("build did not succeed")
                );
                builds.push(record);

                if matches!(policy, FailurePolicy::FailFast) {
                    for rest in &plan.builds[position + 1..] {
                        builds.push(BuildRecord::skipped(rest));
                    }
                    break;
                }
            }
        }
    }

    let summary = build_summary(&builds);
    let status = if canceled {
        RunStatus::Canceled
    } else if summary.failed > 0 {
        RunStatus::Failed
    } else {
        RunStatus::Success
    };

    RunReport {
        status,
        policy,
        builds,
        summary,
    }
}

fn build_summary(builds: &[BuildRecord]) -> RunSummary {
    let succeeded = builds
        .iter()
        .filter(|b| matches!(b.outcome, BuildOutcome::Success))
        .count();
    let failed = builds
        .iter()
        .filter(|b| matches!(b.outcome, BuildOutcome::Failure))
        .count();
    let skipped = builds
        .iter()
        .filter(|b| matches!(b.outcome, BuildOutcome::Skipped))
        .count();

    RunSummary {
        total: builds.len(),
        succeeded,
        failed,
        skipped,
    }
}
