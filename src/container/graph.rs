//! Cycle detection over the wired dependency graph.
//!
//! Depth-first traversal over `dependents` edges with a three-state mark per
//! node (unmarked, in-progress, done), kept in side sets. Re-entering an
//! in-progress node signals a cycle; a done node is skipped, so the whole
//! check is O(V+E) and catches indirect cycles of any length.

use std::collections::HashSet;

use crate::container::key::BindingKey;
use crate::container::storage::DefinitionStorage;
use crate::errors::CoreError;

/// Traversal path for error reporting.
#[derive(Debug, Default)]
pub(crate) struct ResolutionPath {
    keys: Vec<BindingKey>,
}

impl ResolutionPath {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: BindingKey) {
        self.keys.push(key);
    }

    pub(crate) fn pop(&mut self) -> Option<BindingKey> {
        self.keys.pop()
    }

    pub(crate) fn path_string(&self) -> String {
        self.keys
            .iter()
            .map(|key| key.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Verify the wired graph is acyclic, visiting definitions in storage order.
pub(crate) fn detect_cycles(storage: &DefinitionStorage) -> Result<(), CoreError> {
    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();

    for key in storage.all_keys() {
        if !visited.contains(key) {
            let mut path = ResolutionPath::new();
            visit(storage, key, &mut visited, &mut in_progress, &mut path)?;
        }
    }

    Ok(())
}

fn visit(
    storage: &DefinitionStorage,
    key: &BindingKey,
    visited: &mut HashSet<BindingKey>,
    in_progress: &mut HashSet<BindingKey>,
    path: &mut ResolutionPath,
) -> Result<(), CoreError> {
    if in_progress.contains(key) {
        path.push(key.clone());
        return Err(CoreError::CircularDependency {
            path: path.path_string(),
            cycle_binding: key.to_string(),
        });
    }

    if visited.contains(key) {
        return Ok(());
    }

    in_progress.insert(key.clone());
    path.push(key.clone());

    let definition = storage.get_exact(key)?;
    for dependent in definition.dependents() {
        visit(storage, dependent, visited, in_progress, path)?;
    }

    path.pop();
    in_progress.remove(key);
    visited.insert(key.clone());

    Ok(())
}
