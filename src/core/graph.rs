use std::collections::HashMap;

use crate::error::Error;
use crate::registry::AliasRegistry;
use crate::Result;

/// Immutable dependency graph over registered aliases.
///
/// Node indices are the registry's declaration indices, so the planner's
/// declaration-order tie-break is a plain index comparison. Edges point from
/// dependent to dependency ("must build first").
#[derive(Debug)]
pub struct DependencyGraph {
    aliases: Vec<String>,
    index: HashMap<String, usize>,
    dependencies: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn alias(&self, idx: usize) -> &str {
        &self.aliases[idx]
    }

    pub fn position(&self, alias: &str) -> Option<usize> {
        self.index.get(alias).copied()
    }

    /// Nodes `idx` depends on (its prerequisites).
    pub fn dependencies_of(&self, idx: usize) -> &[usize] {
        &self.dependencies[idx]
    }

    /// Nodes that depend on `idx`.
    pub fn dependents_of(&self, idx: usize) -> &[usize] {
        &self.dependents[idx]
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(|deps| deps.len()).sum()
    }
}

/// Accumulates dependency edges against a populated registry, then validates
/// the whole graph in one pass.
pub struct GraphBuilder<'a> {
    registry: &'a AliasRegistry,
    dependencies: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(registry: &'a AliasRegistry) -> Self {
        Self {
            registry,
            dependencies: vec![Vec::new(); registry.len()],
            dependents: vec![Vec::new(); registry.len()],
        }
    }

    /// Declare that `dependent` requires `dependency` built first. Both
    /// endpoints must already be registered aliases.
    pub fn add_edge(&mut self, dependent: &str, dependency: &str) -> Result<()> {
        let dependent_idx = self.registry.position(dependent).ok_or_else(|| {
            Error::alias_unknown(
                dependent,
                Some(format!("declared as depending on '{}'", dependency)),
            )
        })?;
        let dependency_idx = self.registry.position(dependency).ok_or_else(|| {
            Error::alias_unknown(dependency, Some(format!("dependency of '{}'", dependent)))
        })?;

        if !self.dependencies[dependent_idx].contains(&dependency_idx) {
            self.dependencies[dependent_idx].push(dependency_idx);
            self.dependents[dependency_idx].push(dependent_idx);
        }
        Ok(())
    }

    /// Validate and freeze the graph.
    ///
    /// Cycle detection runs here, eagerly, because a cycle makes topological
    /// ordering undefined for every start node that can reach it — one clear
    /// diagnostic at build time beats a partial-ordering failure later.
    pub fn build(self) -> Result<DependencyGraph> {
        if let Some(cycle) = find_cycle(&self.dependencies) {
            let named: Vec<String> = cycle
                .into_iter()
                .map(|idx| {
                    self.registry
                        .entries()
                        .get(idx)
                        .map(|e| e.alias.clone())
                        .unwrap_or_default()
                })
                .collect();
            return Err(Error::graph_cyclic(named));
        }

        let aliases = self.registry.aliases();
        let index: HashMap<String, usize> = aliases
            .iter()
            .enumerate()
            .map(|(idx, alias)| (alias.clone(), idx))
            .collect();

        Ok(DependencyGraph {
            aliases,
            index,
            dependencies: self.dependencies,
            dependents: self.dependents,
        })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Depth-first cycle scan over every node with three-color marking and an
/// explicit frame stack (no recursion). Returns the cycle as node indices,
/// first node repeated at the end, or None for an acyclic graph.
fn find_cycle(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    let node_count = adjacency.len();
    let mut color = vec![Color::White; node_count];
    // (node, next edge offset) frames mirror the recursion stack, so the
    // gray path can be read back when a back-edge appears.
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..node_count {
        if color[root] != Color::White {
            continue;
        }
        color[root] = Color::Gray;
        stack.push((root, 0));

        while !stack.is_empty() {
            let top = stack.len() - 1;
            let (node, offset) = stack[top];

            if let Some(&next) = adjacency[node].get(offset) {
                stack[top].1 += 1;
                match color[next] {
                    Color::White => {
                        color[next] = Color::Gray;
                        stack.push((next, 0));
                    }
                    Color::Gray => {
                        let from = stack.iter().position(|&(n, _)| n == next).unwrap_or(0);
                        let mut cycle: Vec<usize> =
                            stack[from..].iter().map(|&(n, _)| n).collect();
                        cycle.push(next);
                        return Some(cycle);
                    }
                    Color::Black => {}
                }
            } else {
                color[node] = Color::Black;
                stack.pop();
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn registry(aliases: &[&str]) -> AliasRegistry {
        let mut registry = AliasRegistry::new();
        for alias in aliases {
            registry
                .register(*alias, format!("jobs/{}", alias))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_add_edge_unknown_dependent() {
        let registry = registry(&["a"]);
        let mut builder = GraphBuilder::new(&registry);

        let err = builder.add_edge("ghost", "a").unwrap_err();
        assert_eq!(err.code, ErrorCode::AliasUnknown);
        assert_eq!(err.details["alias"], "ghost");
    }

    #[test]
    fn test_add_edge_unknown_dependency() {
        let registry = registry(&["a"]);
        let mut builder = GraphBuilder::new(&registry);

        let err = builder.add_edge("a", "ghost").unwrap_err();
        assert_eq!(err.code, ErrorCode::AliasUnknown);
        assert_eq!(err.details["alias"], "ghost");
        assert_eq!(err.details["context"], "dependency of 'a'");
    }

    #[test]
    fn test_build_acyclic_graph() {
        let registry = registry(&["a", "b", "c", "d"]);
        let mut builder = GraphBuilder::new(&registry);
        builder.add_edge("c", "b").unwrap();
        builder.add_edge("b", "a").unwrap();
        builder.add_edge("d", "a").unwrap();

        let graph = builder.build().unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.dependencies_of(2), &[1]); // c -> b
        assert_eq!(graph.dependents_of(0), &[1, 3]); // a <- b, d
    }

    #[test]
    fn test_duplicate_edge_is_collapsed() {
        let registry = registry(&["a", "b"]);
        let mut builder = GraphBuilder::new(&registry);
        builder.add_edge("b", "a").unwrap();
        builder.add_edge("b", "a").unwrap();

        let graph = builder.build().unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let registry = registry(&["a"]);
        let mut builder = GraphBuilder::new(&registry);
        builder.add_edge("a", "a").unwrap();

        let err = builder.build().unwrap_err();
        assert_eq!(err.code, ErrorCode::GraphCyclic);
        assert_eq!(err.details["cycle"], serde_json::json!(["a", "a"]));
    }

    #[test]
    fn test_cycle_is_named_in_order() {
        let registry = registry(&["a", "b", "c"]);
        let mut builder = GraphBuilder::new(&registry);
        builder.add_edge("a", "b").unwrap();
        builder.add_edge("b", "c").unwrap();
        builder.add_edge("c", "a").unwrap();

        let err = builder.build().unwrap_err();
        assert_eq!(err.code, ErrorCode::GraphCyclic);
        assert_eq!(
            err.details["cycle"],
            serde_json::json!(["a", "b", "c", "a"])
        );
        assert!(err.message.contains("a -> b -> c -> a"));
    }

    #[test]
    fn test_cycle_found_even_when_unreachable_from_first_node() {
        // First declared node is a sink; the cycle sits elsewhere.
        let registry = registry(&["sink", "x", "y"]);
        let mut builder = GraphBuilder::new(&registry);
        builder.add_edge("x", "sink").unwrap();
        builder.add_edge("x", "y").unwrap();
        builder.add_edge("y", "x").unwrap();

        let err = builder.build().unwrap_err();
        assert_eq!(err.code, ErrorCode::GraphCyclic);
    }

    #[test]
    fn test_diamond_is_acyclic() {
        let registry = registry(&["base", "left", "right", "top"]);
        let mut builder = GraphBuilder::new(&registry);
        builder.add_edge("left", "base").unwrap();
        builder.add_edge("right", "base").unwrap();
        builder.add_edge("top", "left").unwrap();
        builder.add_edge("top", "right").unwrap();

        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_disconnected_graph_is_valid() {
        let registry = registry(&["a", "b", "c"]);
        let builder = GraphBuilder::new(&registry);

        let graph = builder.build().unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 0);
    }
}
