//! Alias registry: short user-chosen names bound to remote Jenkins job paths.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Error;
use crate::Result;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasEntry {
    pub alias: String,
    pub job: String,
}

/// Declaration-ordered alias -> job mapping.
///
/// The registry is the universe of valid graph nodes: it must be fully
/// populated before edges are declared. Each alias keeps its declaration
/// index because that index is the planner's deterministic tie-break.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    entries: Vec<AliasEntry>,
    index: HashMap<String, usize>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias. Two aliases may point at the same job, but an
    /// alias key may only be declared once.
    pub fn register(&mut self, alias: impl Into<String>, job: impl Into<String>) -> Result<()> {
        let alias = alias.into();
        let job = job.into();

        if let Some(&existing) = self.index.get(&alias) {
            return Err(Error::alias_duplicate(
                alias,
                self.entries[existing].job.clone(),
                job,
            ));
        }

        self.index.insert(alias.clone(), self.entries.len());
        self.entries.push(AliasEntry { alias, job });
        Ok(())
    }

    /// Resolve an alias to its job path.
    pub fn resolve(&self, alias: &str) -> Result<String> {
        self.position(alias)
            .map(|idx| self.entries[idx].job.clone())
            .ok_or_else(|| Error::alias_unknown(alias, None))
    }

    /// Declaration index of an alias, if registered.
    pub fn position(&self, alias: &str) -> Option<usize> {
        self.index.get(alias).copied()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.index.contains_key(alias)
    }

    /// Aliases in declaration order.
    pub fn aliases(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.alias.clone()).collect()
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
