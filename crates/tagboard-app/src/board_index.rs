//! Derived list and location indexes over the loaded files.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tagboard_core::{File, Task, TaskId};

use crate::list_resolver::ListResolver;

/// Ordered list membership and task locations.
///
/// The index is a view over the files; it is rebuilt after every committed
/// change and never edited in place.
#[derive(Debug, Default, Clone)]
pub struct BoardIndex {
    /// Ordered task ids per list name.
    pub lists: BTreeMap<String, Vec<TaskId>>,
    /// Owning file path per task id.
    pub locations: HashMap<TaskId, String>,
}

impl BoardIndex {
    /// Build the index for `files`.
    #[must_use]
    pub fn build(files: &BTreeMap<String, File>, resolver: &ListResolver) -> Self {
        let mut index = Self::default();
        index.rebuild(files, resolver);
        index
    }

    /// Recompute every index from `files`.
    pub fn rebuild(&mut self, files: &BTreeMap<String, File>, resolver: &ListResolver) {
        self.lists.clear();
        self.locations.clear();

        let tasks: Vec<&Task> = files.values().flat_map(|file| file.tasks()).collect();
        for task in &tasks {
            self.locations.insert(task.id, task.file_path.clone());
        }

        let names: BTreeSet<&str> = resolver
            .lists()
            .iter()
            .map(|list| list.name.as_str())
            .chain(tasks.iter().map(|task| task.list.as_str()))
            .collect();
        for name in names {
            let ids = resolver
                .resolve(name, tasks.iter().copied())
                .into_iter()
                .map(|task| task.id)
                .collect();
            self.lists.insert(name.to_owned(), ids);
        }

        tracing::debug!(
            tasks = self.locations.len(),
            lists = self.lists.len(),
            "rebuilt board index"
        );
    }

    /// Path of the file holding `id`.
    #[must_use]
    pub fn location(&self, id: TaskId) -> Option<&str> {
        self.locations.get(&id).map(String::as_str)
    }

    /// Ordered ids in list `name`; empty for unknown lists.
    #[must_use]
    pub fn list(&self, name: &str) -> &[TaskId] {
        self.lists.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Rank of `id` within list `name`.
    #[must_use]
    pub fn position(&self, name: &str, id: TaskId) -> Option<usize> {
        self.list(name).iter().position(|candidate| *candidate == id)
    }

    /// Number of indexed tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether no task is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
