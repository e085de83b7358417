//! Storage abstraction for file contents.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// Storage backend that lists, reads, and writes board files.
///
/// Paths are `/`-separated and relative to the board root.
pub trait FileStore {
    /// Error type bubbled up from the backing store.
    type Error: Into<anyhow::Error>;

    /// Enumerate every file that may contain tasks.
    ///
    /// # Errors
    /// Returns a store-specific error when listing fails.
    fn list_files(&self) -> Result<Vec<String>, Self::Error>;

    /// Read a file as text.
    ///
    /// `None` when the file does not exist, and also when it exists but holds
    /// no tasks by construction (binary or oversized); use
    /// [`exists`](Self::exists) to tell the two apart.
    ///
    /// # Errors
    /// Returns a store-specific error when the file exists but cannot be read.
    fn read_file(&self, path: &str) -> Result<Option<String>, Self::Error>;

    /// Whether anything is stored at `path`, readable as text or not.
    ///
    /// # Errors
    /// Returns a store-specific error when the check itself fails.
    fn exists(&self, path: &str) -> Result<bool, Self::Error>;

    /// Replace the full contents of a file, creating it when missing.
    ///
    /// # Errors
    /// Returns a store-specific error when persisting fails.
    fn write_file(&self, path: &str, text: &str) -> Result<(), Self::Error>;
}

impl<S: FileStore + ?Sized> FileStore for Arc<S> {
    type Error = S::Error;

    fn list_files(&self) -> Result<Vec<String>, Self::Error> {
        (**self).list_files()
    }

    fn read_file(&self, path: &str) -> Result<Option<String>, Self::Error> {
        (**self).read_file(path)
    }

    fn exists(&self, path: &str) -> Result<bool, Self::Error> {
        (**self).exists(path)
    }

    fn write_file(&self, path: &str, text: &str) -> Result<(), Self::Error> {
        (**self).write_file(path, text)
    }
}

/// Errors raised by [`MemoryStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// A write was rejected by an injected failure.
    #[error("write rejected for {path}")]
    WriteRejected {
        /// Target path.
        path: String,
    },
}

/// In-memory [`FileStore`] with write failure injection.
///
/// Clones share the same files, so a test can keep a handle while the
/// repository owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    files: Mutex<BTreeMap<String, String>>,
    fail_writes: Mutex<HashSet<String>>,
    writes: Mutex<Vec<String>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_file(self, path: &str, text: &str) -> Self {
        self.insert(path, text);
        self
    }

    /// Insert or replace a file without recording a write.
    pub fn insert(&self, path: &str, text: &str) {
        guard(&self.inner.files).insert(path.to_owned(), text.to_owned());
    }

    /// Current contents of `path`.
    #[must_use]
    pub fn contents(&self, path: &str) -> Option<String> {
        guard(&self.inner.files).get(path).cloned()
    }

    /// Make every following write to `path` fail.
    pub fn fail_writes_to(&self, path: &str) {
        guard(&self.inner.fail_writes).insert(path.to_owned());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        guard(&self.inner.fail_writes).clear();
    }

    /// Paths of successful writes, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        guard(&self.inner.writes).clone()
    }
}

impl FileStore for MemoryStore {
    type Error = MemoryStoreError;

    fn list_files(&self) -> Result<Vec<String>, Self::Error> {
        Ok(guard(&self.inner.files).keys().cloned().collect())
    }

    fn read_file(&self, path: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.contents(path))
    }

    fn exists(&self, path: &str) -> Result<bool, Self::Error> {
        Ok(guard(&self.inner.files).contains_key(path))
    }

    fn write_file(&self, path: &str, text: &str) -> Result<(), Self::Error> {
        if guard(&self.inner.fail_writes).contains(path) {
            return Err(MemoryStoreError::WriteRejected { path: path.to_owned() });
        }
        self.insert(path, text);
        guard(&self.inner.writes).push(path.to_owned());
        Ok(())
    }
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_and_records_writes() -> anyhow::Result<()> {
        let store = MemoryStore::new().with_file("a.md", "#TODO a\n");
        assert_eq!(store.list_files()?, vec!["a.md".to_owned()]);
        assert_eq!(store.read_file("missing.md")?, None);
        assert!(store.exists("a.md")?);
        assert!(!store.exists("missing.md")?);

        store.write_file("b.md", "#DONE b\n")?;
        assert_eq!(store.read_file("b.md")?.as_deref(), Some("#DONE b\n"));
        assert_eq!(store.writes(), vec!["b.md".to_owned()]);
        Ok(())
    }

    #[test]
    fn injected_failures_reject_writes_until_cleared() {
        let store = MemoryStore::new().with_file("a.md", "old");
        store.fail_writes_to("a.md");
        assert_eq!(
            store.write_file("a.md", "new"),
            Err(MemoryStoreError::WriteRejected { path: "a.md".into() })
        );
        assert_eq!(store.contents("a.md").as_deref(), Some("old"));

        store.clear_failures();
        assert!(store.write_file("a.md", "new").is_ok());
        assert_eq!(store.contents("a.md").as_deref(), Some("new"));
    }

    #[test]
    fn arc_store_delegates() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new().with_file("x.rs", "// TODO: x\n"));
        assert_eq!(store.list_files()?.len(), 1);
        Ok(())
    }
}
