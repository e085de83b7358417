//! Async facade over [`Repository`] for tokio callers.

use std::sync::Arc;

use tagboard_core::{File, Task, TaskId, Tokenizer};
use tokio::sync::Mutex;

use crate::error::{BoardError, BoardResult};
use crate::repository::{AddTask, MoveOutcome, MoveRequest, Repository};
use crate::store::FileStore;

/// Shared handle that serializes board operations through one lock.
///
/// Each call runs the blocking repository operation on tokio's blocking
/// pool, so the returned future completes only once the store and the
/// in-memory board agree.
pub struct AsyncRepository<S, T> {
    inner: Arc<Mutex<Repository<S, T>>>,
}

impl<S, T> Clone for AsyncRepository<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, T> AsyncRepository<S, T>
where
    S: FileStore + Send + 'static,
    T: Tokenizer + Send + 'static,
{
    /// Wrap a loaded repository.
    #[must_use]
    pub fn new(repository: Repository<S, T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(repository)),
        }
    }

    /// Move one task.
    ///
    /// # Errors
    /// Same as [`Repository::move_task`].
    pub async fn move_task(&self, request: MoveRequest) -> BoardResult<MoveOutcome> {
        self.run(move |repo| repo.move_task(request)).await
    }

    /// Move several tasks to consecutive positions.
    ///
    /// # Errors
    /// Same as [`Repository::move_tasks`].
    pub async fn move_tasks(
        &self,
        ids: Vec<TaskId>,
        new_list: String,
        new_pos: usize,
    ) -> BoardResult<MoveOutcome> {
        self.run(move |repo| repo.move_tasks(&ids, &new_list, new_pos))
            .await
    }

    /// Rewrite a task's line.
    ///
    /// # Errors
    /// Same as [`Repository::modify_task`].
    pub async fn modify_task(&self, task: Task, should_write: bool) -> BoardResult<File> {
        self.run(move |repo| repo.modify_task(&task, should_write))
            .await
    }

    /// Add a new task line.
    ///
    /// # Errors
    /// Same as [`Repository::add_task_to_file`].
    pub async fn add_task_to_file(&self, request: AddTask) -> BoardResult<Task> {
        self.run(move |repo| repo.add_task_to_file(request)).await
    }

    /// Re-read a file after an external edit.
    ///
    /// # Errors
    /// Same as [`Repository::refresh_file`].
    pub async fn refresh_file(&self, path: String) -> BoardResult<()> {
        self.run(move |repo| repo.refresh_file(&path)).await
    }

    /// Snapshot of the ordered tasks in `name`.
    pub async fn tasks_in_list(&self, name: &str) -> Vec<Task> {
        let repo = self.inner.lock().await;
        repo.tasks_in_list(name).into_iter().cloned().collect()
    }

    /// Snapshot of the task with `id`.
    pub async fn find_task(&self, id: TaskId) -> Option<Task> {
        self.inner.lock().await.find_task(id).cloned()
    }

    async fn run<R, F>(&self, op: F) -> BoardResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Repository<S, T>) -> BoardResult<R> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut repo = inner.blocking_lock();
            op(&mut repo)
        })
        .await
        .map_err(|err| BoardError::Interrupted(err.to_string()))?
    }
}
