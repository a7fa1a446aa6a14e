// Public modules
pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
pub mod jenkins;
pub mod plan;
pub mod registry;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use executor::{
    BuildOutcome, BuildRecord, CancelToken, FailurePolicy, JobTrigger, RunReport, RunStatus,
    RunSummary, TriggerOutcome, TriggerStatus,
};
pub use graph::{DependencyGraph, GraphBuilder};
pub use plan::{ExecutionPlan, PlannedBuild};
pub use registry::AliasRegistry;
