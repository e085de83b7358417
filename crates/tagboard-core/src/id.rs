use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a task (UUID v7).
///
/// Ids are surrogates: they are minted when a file is first tokenized and
/// carried over while the owning file is re-tokenized within one session.
/// They are never written into files.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    #[must_use]
    /// Mint an identifier for a freshly discovered task.
    pub fn new() -> Self {
        // v7 sorts by mint time, so ids from one load follow parse order.
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_minted_later_sort_later() {
        let first = TaskId::new();
        let second = TaskId::new();
        assert_eq!(first.0.get_version_num(), 7);
        assert!(first < second);
    }

    #[test]
    fn task_id_serializes_as_plain_string() {
        let id = TaskId::new();
        let json = serde_json::to_string(&id).unwrap_or_else(|err| panic!("serialize: {err}"));
        assert_eq!(json, format!("\"{id}\""));
    }
}
