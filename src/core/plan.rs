use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::error::Error;
use crate::graph::DependencyGraph;
use crate::registry::AliasRegistry;
use crate::utils::suggest;
use crate::Result;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedBuild {
    pub alias: String,
    pub job: String,
}

/// Ordered set of builds for one run: the start alias plus everything it
/// transitively depends on, minus exclusions, in an order where every
/// surviving prerequisite precedes its dependents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub start: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<String>,
    pub builds: Vec<PlannedBuild>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.builds.iter().map(|b| b.alias.clone()).collect()
    }
}

pub fn plan(
    graph: &DependencyGraph,
    registry: &AliasRegistry,
    start: &str,
    excluded: &[String],
) -> Result<ExecutionPlan> {
    let start_idx = graph.position(start).ok_or_else(|| {
        let mut err = Error::start_not_found(start);
        if let Some(candidate) = suggest::closest(start, &registry.aliases()) {
            err = err.with_hint(format!("Did you mean '{}'?", candidate));
        }
        err
    })?;

    let mut is_excluded = vec![false; graph.len()];
    for alias in excluded {
        let idx = graph
            .position(alias)
            .ok_or_else(|| Error::alias_unknown(alias, Some("exclusion list".to_string())))?;
        is_excluded[idx] = true;
    }

    // Walk dependency edges backward from the start. Excluded nodes are
    // absent from the walk entirely: a prerequisite reachable only through
    // an excluded node stays out of the plan, while surviving nodes keep
    // their places and lose the constraint through the excluded node.
    let mut reachable = vec![false; graph.len()];
    if !is_excluded[start_idx] {
        reachable[start_idx] = true;
        let mut work = vec![start_idx];
        while let Some(node) = work.pop() {
            for &dep in graph.dependencies_of(node) {
                if !reachable[dep] && !is_excluded[dep] {
                    reachable[dep] = true;
                    work.push(dep);
                }
            }
        }
    }

    // Kahn's ordering restricted to the survivors. In-degree counts only
    // surviving prerequisites; the ready heap pops the smallest declaration
    // index first, which keeps output stable across runs with identical
    // configuration.
    let mut indegree = vec![0usize; graph.len()];
    let mut surviving = 0usize;
    for node in 0..graph.len() {
        if !reachable[node] {
            continue;
        }
        surviving += 1;
        indegree[node] = graph
            .dependencies_of(node)
            .iter()
            .filter(|&&dep| reachable[dep])
            .count();
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..graph.len())
        .filter(|&node| reachable[node] && indegree[node] == 0)
        .map(Reverse)
        .collect();

    let mut builds = Vec::with_capacity(surviving);
    while let Some(Reverse(node)) = ready.pop() {
        let alias = graph.alias(node).to_string();
        let job = registry.resolve(&alias)?;
        builds.push(PlannedBuild { alias, job });

        for &dependent in graph.dependents_of(node) {
            if reachable[dependent] && indegree[dependent] > 0 {
                indegree[dependent] -= 1;
                if indegree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }
    }

    if builds.len() != surviving {
        let pending: Vec<String> = (0..graph.len())
            .filter(|&node| reachable[node] && indegree[node] > 0)
            .map(|node| graph.alias(node).to_string())
            .collect();
        return Err(Error::internal_invariant(
            "no zero in-degree node among remaining planned aliases",
            pending,
        ));
    }

    Ok(ExecutionPlan {
        start: start.to_string(),
        excluded: excluded.to_vec(),
        builds,
    })
}
