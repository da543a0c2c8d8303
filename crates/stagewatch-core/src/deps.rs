//! Click-to-navigate lookup for dependency references.

use crate::model::Task;
use std::collections::HashMap;

/// Task lookup keyed by id, process id and display name.
///
/// Ids win over process ids, which win over names, so looking a task up by
/// its own id always returns that task. Among names the last write wins.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    tasks: Vec<Task>,
    keys: HashMap<String, usize>,
}

impl DependencyIndex {
    pub fn build(tasks: &[Task]) -> Self {
        let mut keys = HashMap::with_capacity(tasks.len() * 3);

        for (slot, task) in tasks.iter().enumerate() {
            if !task.name.is_empty() {
                keys.insert(task.name.clone(), slot);
            }
        }
        for (slot, task) in tasks.iter().enumerate() {
            if task.process_id != 0 {
                keys.insert(task.process_id.to_string(), slot);
            }
        }
        for (slot, task) in tasks.iter().enumerate() {
            keys.insert(task.id.clone(), slot);
        }

        Self {
            tasks: tasks.to_vec(),
            keys,
        }
    }

    /// Exact lookup; no fuzzy matching.
    pub fn resolve(&self, reference: &str) -> Option<&Task> {
        self.keys
            .get(reference.trim())
            .and_then(|slot| self.tasks.get(*slot))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, process_id: i64, name: &str) -> Task {
        Task {
            id: id.to_string(),
            process_id,
            name: name.to_string(),
            ..Task::default()
        }
    }

    #[test]
    fn resolves_by_every_key() {
        let tasks = vec![task("10", 501, "Extract"), task("11", 502, "Load")];
        let index = DependencyIndex::build(&tasks);

        assert_eq!(index.resolve("10"), Some(&tasks[0]));
        assert_eq!(index.resolve("502"), Some(&tasks[1]));
        assert_eq!(index.resolve("Load"), Some(&tasks[1]));
        assert_eq!(index.resolve("load"), None);
        assert_eq!(index.resolve("missing"), None);
    }

    #[test]
    fn own_id_always_round_trips() {
        let tasks = vec![
            task("1", 2, "3"),
            task("2", 3, "1"),
            task("3", 1, "2"),
            task("seq-4", 0, ""),
        ];
        let index = DependencyIndex::build(&tasks);
        for t in &tasks {
            assert_eq!(index.resolve(&t.id), Some(t));
        }
    }

    #[test]
    fn later_name_wins_on_collision() {
        let tasks = vec![task("a", 1, "Same"), task("b", 2, "Same")];
        let index = DependencyIndex::build(&tasks);
        assert_eq!(index.resolve("Same").map(|t| t.id.as_str()), Some("b"));
    }
}
