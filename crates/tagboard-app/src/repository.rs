//! Board repository: parsed files, list views, and the move/modify algorithms.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use anyhow::{Context, Result, anyhow};
use tagboard_core::task::parse_order;
use tagboard_core::{
    COMPLETED_KEY, File, LineError, LineTokenizer, Meta, ORDER_KEY, RawTask, SourceKind, Syntax, Task,
    TaskFilter, TaskId, TokenShape, Tokenizer, comment_lead,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

use crate::board_index::BoardIndex;
use crate::config::ProjectConfig;
use crate::error::{BoardError, BoardResult};
use crate::list_resolver::{BoardList, ListResolver};
use crate::order::OrderAssigner;
use crate::store::FileStore;

const CHECKBOX_LEAD: &str = "- [ ] ";

/// Request to move one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    /// Task to move.
    pub task: TaskId,
    /// Destination list.
    pub new_list: String,
    /// Zero-based rank in the destination list.
    pub new_pos: usize,
}

/// Result of a committed move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Moved task ids, in the order they were placed.
    pub moved: Vec<TaskId>,
    /// Files whose text changed.
    pub changed_paths: Vec<String>,
}

impl MoveOutcome {
    /// Whether the move left the board untouched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.moved.is_empty()
    }
}

/// Request to append a new task to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddTask {
    /// Target file; `cards.default_file` when `None`.
    pub path: Option<String>,
    /// Target list; the default list when `None`.
    pub list: Option<String>,
    /// Task text.
    pub text: String,
    /// Extra meta written after the text.
    pub meta: Meta,
}

/// A configured list together with its ordered tasks.
#[derive(Debug, Clone)]
pub struct ListView<'a> {
    /// List configuration.
    pub list: &'a BoardList,
    /// Tasks in list order.
    pub tasks: Vec<&'a Task>,
}

/// In-memory board built from a [`FileStore`].
///
/// Every mutation is staged on copies of the affected files, written through
/// the store, and only then swapped in; on failure the board is unchanged.
pub struct Repository<S, T = LineTokenizer> {
    store: S,
    tokenizer: T,
    config: ProjectConfig,
    resolver: ListResolver,
    assigner: OrderAssigner,
    files: BTreeMap<String, File>,
    index: BoardIndex,
}

impl<S: FileStore> Repository<S, LineTokenizer> {
    /// Load a board using the line tokenizer configured by `config`.
    ///
    /// # Errors
    /// Returns an error when the store cannot be listed or read, or when a
    /// list filter does not parse.
    pub fn open(store: S, config: ProjectConfig) -> Result<Self> {
        let tokenizer = LineTokenizer::new(config.syntax());
        Self::load(store, tokenizer, config)
    }
}

impl<S: FileStore, T: Tokenizer> Repository<S, T> {
    /// Load every file from `store` and build the board.
    ///
    /// # Errors
    /// Returns an error when the store cannot be listed or read, or when a
    /// list filter does not parse.
    pub fn load(store: S, tokenizer: T, config: ProjectConfig) -> Result<Self> {
        let resolver = ListResolver::new(&config).context("failed to resolve configured lists")?;
        let assigner = OrderAssigner::from_config(&config.cards);
        let paths = store
            .list_files()
            .map_err(Into::<anyhow::Error>::into)
            .context("failed to list files")?;

        let mut repo = Self {
            store,
            tokenizer,
            config,
            resolver,
            assigner,
            files: BTreeMap::new(),
            index: BoardIndex::default(),
        };
        for path in paths {
            let Some(content) = repo
                .store
                .read_file(&path)
                .map_err(Into::<anyhow::Error>::into)
                .with_context(|| format!("failed to read {path}"))?
            else {
                continue;
            };
            let file = repo.parse_external(&path, content, None);
            repo.install(file);
        }
        repo.rebuild_index();
        debug!(
            files = repo.files.len(),
            tasks = repo.index.len(),
            "loaded board"
        );
        Ok(repo)
    }

    /// Project configuration.
    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// List resolver built from the configuration.
    #[must_use]
    pub const fn resolver(&self) -> &ListResolver {
        &self.resolver
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Every task, in path and line order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.files.values().flat_map(|file| file.tasks().iter())
    }

    /// Files holding at least one task, in path order.
    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.files.values()
    }

    /// File at `path`, if it holds tasks.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&File> {
        self.files.get(path)
    }

    /// Task with `id`.
    #[must_use]
    pub fn find_task(&self, id: TaskId) -> Option<&Task> {
        let path = self.index.location(id)?;
        self.files.get(path)?.task(id)
    }

    /// Task on `line` of `path`.
    #[must_use]
    pub fn find_task_at(&self, path: &str, line: usize) -> Option<&Task> {
        self.files.get(path)?.task_at_line(line)
    }

    /// Ordered tasks of list `name` (concrete, virtual, or unconfigured).
    #[must_use]
    pub fn tasks_in_list(&self, name: &str) -> Vec<&Task> {
        self.index
            .list(name)
            .iter()
            .filter_map(|id| self.find_task(*id))
            .collect()
    }

    /// Configured lists that are not ignored, with their tasks.
    #[must_use]
    pub fn lists(&self) -> Vec<ListView<'_>> {
        self.resolver
            .lists()
            .iter()
            .filter(|list| !list.ignore)
            .map(|list| ListView {
                list,
                tasks: self.tasks_in_list(&list.name),
            })
            .collect()
    }

    /// Tasks matching `filter`, in path and line order.
    #[must_use]
    pub fn filter_tasks(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.tasks().filter(|task| filter.matches(task)).collect()
    }

    /// Move one task; see [`move_tasks`](Self::move_tasks).
    ///
    /// # Errors
    /// Same as [`move_tasks`](Self::move_tasks).
    pub fn move_task(&mut self, request: MoveRequest) -> BoardResult<MoveOutcome> {
        self.move_tasks(&[request.task], &request.new_list, request.new_pos)
    }

    /// Move `ids` into `new_list` so they occupy consecutive ranks from `new_pos`.
    ///
    /// Duplicate ids are collapsed and `new_pos` is clamped to the list
    /// length. A move that would not change anything writes nothing.
    ///
    /// # Errors
    /// - [`BoardError::InvalidTarget`] for unknown or virtual lists;
    /// - [`BoardError::TaskNotFound`] for ids not on the board;
    /// - [`BoardError::OrderConflict`] when no order keys fit;
    /// - [`BoardError::PersistenceError`] when the store rejects a write.
    pub fn move_tasks(
        &mut self,
        ids: &[TaskId],
        new_list: &str,
        new_pos: usize,
    ) -> BoardResult<MoveOutcome> {
        self.resolver.ensure_move_target(new_list)?;

        let mut moving: Vec<TaskId> = Vec::with_capacity(ids.len());
        for id in ids {
            if self.index.location(*id).is_none() {
                return Err(BoardError::TaskNotFound(*id));
            }
            if !moving.contains(id) {
                moving.push(*id);
            }
        }
        if moving.is_empty() {
            return Ok(MoveOutcome::default());
        }

        let current: Vec<TaskId> = self.index.list(new_list).to_vec();
        let siblings: Vec<TaskId> = current
            .iter()
            .copied()
            .filter(|id| !moving.contains(id))
            .collect();
        let position = new_pos.min(siblings.len());
        let mut desired = siblings.clone();
        desired.splice(position..position, moving.iter().copied());

        let already_there = moving
            .iter()
            .all(|id| self.find_task(*id).is_some_and(|task| task.list == new_list));
        if already_there && desired == current {
            debug!(list = new_list, position, "move leaves board unchanged");
            return Ok(MoveOutcome::default());
        }

        let sibling_keys: Vec<Option<i64>> = siblings
            .iter()
            .map(|id| self.find_task(*id).and_then(|task| task.order))
            .collect();
        let plan = self
            .assigner
            .assign_many(&sibling_keys, position, moving.len())?;

        let order_meta = self.config.cards.order_meta;
        let mut staged: BTreeMap<String, File> = BTreeMap::new();
        let mut touched = self.stage_renumbered(&mut staged, &siblings, &plan.renumbered)?;

        let stamp = self.completion_stamp();
        for (id, key) in moving.iter().zip(&plan.inserted) {
            let task = self.stage_task(&mut staged, *id)?;
            let previous_list = std::mem::replace(&mut task.list, new_list.to_owned());
            task.set_order(Some(*key), order_meta);
            if let Some((done, stamp)) = &stamp {
                if task.list == *done && previous_list != *done {
                    task.meta.set(COMPLETED_KEY, stamp.clone());
                } else if previous_list == *done && task.list != *done {
                    task.meta.remove(COMPLETED_KEY);
                }
            }
            let path = task.file_path.clone();
            touched.entry(path).or_default().insert(*id);
        }

        if !order_meta {
            relocate_in_files(&mut staged, &desired, &moving)?;
        }

        render_touched(&mut staged, &touched, self.tokenizer.syntax())?;

        let changed_paths = self.write_staged(&staged)?;
        self.commit(staged, &changed_paths);
        info!(
            list = new_list,
            position,
            moved = moving.len(),
            files = changed_paths.len(),
            "moved tasks"
        );
        Ok(MoveOutcome {
            moved: moving,
            changed_paths,
        })
    }

    /// Rewrite a task's line from `task`'s text and meta.
    ///
    /// The stored task with the same id supplies the location and the list;
    /// its order is kept. Moving between lists goes through
    /// [`move_tasks`](Self::move_tasks), so a different `list` on `task` is
    /// ignored. With `should_write` unset only the in-memory file changes.
    /// Returns a copy of the refreshed file.
    ///
    /// # Errors
    /// - [`BoardError::TaskNotFound`] when the id is not on the board;
    /// - [`BoardError::PersistenceError`] when the store rejects the write.
    pub fn modify_task(&mut self, task: &Task, should_write: bool) -> BoardResult<File> {
        let mut staged: BTreeMap<String, File> = BTreeMap::new();
        let syntax = self.tokenizer.syntax().clone();
        let stored = self.stage_task(&mut staged, task.id)?;
        let path = stored.file_path.clone();

        let persisted_order = stored.meta.get(ORDER_KEY).map(<[String]>::to_vec);
        stored.text.clone_from(&task.text);
        stored.meta = task.meta.clone();
        stored.meta.remove(ORDER_KEY);
        if let Some(values) = persisted_order {
            for value in values {
                stored.meta.push(ORDER_KEY, value);
            }
        }

        let ids: BTreeSet<TaskId> = [task.id].into_iter().collect();
        if let Some(file) = staged.get_mut(&path) {
            file.render_tasks(&ids, &syntax)
                .map_err(|err| line_error(&path, err))?;
        }

        let changed_paths = if should_write {
            self.write_staged(&staged)?
        } else {
            Vec::new()
        };
        let reparse: Vec<String> = staged.keys().cloned().collect();
        self.commit(staged, &reparse);
        info!(task = %task.id, path, written = !changed_paths.is_empty(), "modified task");

        self.files
            .get(&path)
            .cloned()
            .ok_or(BoardError::TaskNotFound(task.id))
    }

    /// Add a new task line to a file, creating the file if needed.
    ///
    /// Markdown files get a `#LIST` item. Source files get a comment in the
    /// style of the file's first task, so a source file must already hold one.
    ///
    /// # Errors
    /// - [`BoardError::InvalidTarget`] when the list is unknown or virtual, or
    ///   the source file has no task to take the comment style from;
    /// - [`BoardError::OrderConflict`] when no order key fits;
    /// - [`BoardError::PersistenceError`] when the store fails, or the path
    ///   holds a file the store does not read as text.
    pub fn add_task_to_file(&mut self, request: AddTask) -> BoardResult<Task> {
        let path = request
            .path
            .unwrap_or_else(|| self.config.cards.default_file.clone());
        let list = match request.list {
            Some(list) => list,
            None => self
                .resolver
                .default_list()
                .map(str::to_owned)
                .ok_or_else(|| BoardError::invalid_target("", "no lists are configured"))?,
        };
        self.resolver.ensure_move_target(&list)?;

        let to_top = self.config.cards.add_new_cards_to_top;
        let siblings: Vec<TaskId> = self.index.list(&list).to_vec();
        let sibling_keys: Vec<Option<i64>> = siblings
            .iter()
            .map(|id| self.find_task(*id).and_then(|task| task.order))
            .collect();
        let position = if to_top { 0 } else { siblings.len() };
        let plan = self.assigner.assign(&sibling_keys, position)?;
        let key = plan.first_key();

        let mut staged: BTreeMap<String, File> = BTreeMap::new();
        let touched = self.stage_renumbered(&mut staged, &siblings, &plan.renumbered)?;
        render_touched(&mut staged, &touched, self.tokenizer.syntax())?;

        let file = match staged.entry(path.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file = match self.files.get(&path) {
                    Some(file) => file.clone(),
                    None => {
                        let content = self.read_for_append(&path)?;
                        self.parse_external(&path, content, None)
                    }
                };
                entry.insert(file)
            }
        };

        let source_kind = SourceKind::from_path(&path);
        let (lead, token, tail) = match source_kind {
            SourceKind::Markdown if self.config.cards.add_check_box_tasks => {
                (CHECKBOX_LEAD.to_owned(), TokenShape::Hash, String::new())
            }
            SourceKind::Markdown => (String::new(), TokenShape::Hash, String::new()),
            SourceKind::Code => {
                let template = file.tasks().first().ok_or_else(|| {
                    BoardError::invalid_target(
                        &list,
                        format!("{path} has no comment task to copy the style from"),
                    )
                })?;
                // A bare `LIST:` is only recognised for included lists.
                let token = match template.token {
                    TokenShape::Bare if !self.tokenizer.syntax().includes_list(&list) => {
                        TokenShape::HashColon
                    }
                    shape => shape,
                };
                (comment_lead(&template.lead), token, template.tail.clone())
            }
        };
        let mut task = Task {
            id: TaskId::new(),
            file_path: path.clone(),
            line: 0,
            list: list.clone(),
            text: request.text.split_whitespace().collect::<Vec<_>>().join(" "),
            meta: request.meta,
            order: None,
            source_kind,
            lead,
            token,
            tail,
        };
        task.set_order(key, self.config.cards.order_meta);
        task.line = match file.tasks().first() {
            Some(first) if to_top => first.line,
            _ => file.content.lines().count() + 1,
        };
        file.insert_line(task.line, &task.render_line(self.tokenizer.syntax()))
            .map_err(|err| line_error(&path, err))?;

        let changed_paths = self.write_staged(&staged)?;
        self.commit(staged, &changed_paths);

        let added = self
            .files
            .get_mut(&path)
            .and_then(|file| file.tasks.iter_mut().find(|added| added.line == task.line))
            .ok_or_else(|| {
                BoardError::invalid_target(&list, "the new line was not recognised as a task")
            })?;
        if added.order.is_none() {
            added.order = key;
        }
        let added = added.clone();
        self.rebuild_index();
        info!(path, list, line = added.line, "added task");
        Ok(added)
    }

    /// Re-read `path` from the store after an external edit.
    ///
    /// Tasks keep their ids when found on the same line with the same text,
    /// or elsewhere with the same text.
    ///
    /// # Errors
    /// Returns [`BoardError::PersistenceError`] when the store cannot read the file.
    pub fn refresh_file(&mut self, path: &str) -> BoardResult<()> {
        let content = self
            .store
            .read_file(path)
            .map_err(|err| BoardError::persistence(path, err))?;
        let Some(content) = content else {
            self.remove_file(path);
            return Ok(());
        };
        let previous = self.files.get(path).cloned();
        let file = self.parse_external(path, content, previous.as_ref());
        self.install(file);
        self.rebuild_index();
        debug!(path, "refreshed file");
        Ok(())
    }

    /// Drop `path` and its tasks from the board.
    pub fn remove_file(&mut self, path: &str) -> Option<File> {
        let removed = self.files.remove(path);
        if removed.is_some() {
            self.rebuild_index();
            debug!(path, "removed file");
        }
        removed
    }

    // Text of a file about to receive a new line; missing files start empty.
    fn read_for_append(&self, path: &str) -> BoardResult<String> {
        let content = self
            .store
            .read_file(path)
            .map_err(|err| BoardError::persistence(path, err))?;
        if let Some(content) = content {
            return Ok(content);
        }
        let exists = self
            .store
            .exists(path)
            .map_err(|err| BoardError::persistence(path, err))?;
        if exists {
            return Err(BoardError::persistence(
                path,
                anyhow!("not a text file the board can edit"),
            ));
        }
        Ok(String::new())
    }

    fn stage_task<'a>(
        &self,
        staged: &'a mut BTreeMap<String, File>,
        id: TaskId,
    ) -> BoardResult<&'a mut Task> {
        let path = self
            .index
            .location(id)
            .ok_or(BoardError::TaskNotFound(id))?;
        let file = match staged.entry(path.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file = self
                    .files
                    .get(path)
                    .cloned()
                    .ok_or(BoardError::TaskNotFound(id))?;
                entry.insert(file)
            }
        };
        file.task_mut(id).ok_or(BoardError::TaskNotFound(id))
    }

    // Apply renumbered sibling keys; returns the tasks whose line must be re-rendered.
    fn stage_renumbered(
        &self,
        staged: &mut BTreeMap<String, File>,
        siblings: &[TaskId],
        renumbered: &[(usize, i64)],
    ) -> BoardResult<BTreeMap<String, BTreeSet<TaskId>>> {
        let order_meta = self.config.cards.order_meta;
        let mut touched: BTreeMap<String, BTreeSet<TaskId>> = BTreeMap::new();
        for (idx, key) in renumbered {
            let Some(id) = siblings.get(*idx).copied() else {
                continue;
            };
            let task = self.stage_task(staged, id)?;
            if order_meta {
                task.set_order(Some(*key), true);
                touched.entry(task.file_path.clone()).or_default().insert(id);
            } else {
                // Session key only; `order:` text on the line stays as written.
                task.order = Some(*key);
            }
        }
        Ok(touched)
    }

    fn completion_stamp(&self) -> Option<(String, String)> {
        if !self.config.cards.add_completed_meta {
            return None;
        }
        let done = self.resolver.done_list()?.to_owned();
        let now = OffsetDateTime::now_utc();
        let stamp = now.replace_nanosecond(0).unwrap_or(now).format(&Rfc3339).ok()?;
        Some((done, stamp))
    }

    // Write every staged file whose text changed; undo earlier writes on failure.
    fn write_staged(&self, staged: &BTreeMap<String, File>) -> BoardResult<Vec<String>> {
        let mut written: Vec<&str> = Vec::new();
        for (path, file) in staged {
            let unchanged = self
                .files
                .get(path)
                .is_some_and(|original| original.content == file.content);
            if unchanged {
                continue;
            }
            if let Err(err) = self.store.write_file(path, &file.content) {
                let err = BoardError::persistence(path, err);
                warn!(path, error = %err, "write failed, restoring earlier writes");
                self.restore(&written);
                return Err(err);
            }
            debug!(path, "wrote file");
            written.push(path);
        }
        Ok(written.into_iter().map(str::to_owned).collect())
    }

    fn restore(&self, written: &[&str]) {
        for path in written {
            let Some(original) = self.files.get(*path) else {
                continue;
            };
            if let Err(err) = self.store.write_file(path, &original.content) {
                let err: anyhow::Error = err.into();
                warn!(path, error = %err, "failed to restore file");
            }
        }
    }

    // Swap staged files in; files in `reparse` are re-tokenized from their new text.
    fn commit(&mut self, staged: BTreeMap<String, File>, reparse: &[String]) {
        for (path, file) in staged {
            let file = if reparse.contains(&path) {
                self.parse_tracked(&file)
            } else {
                file
            };
            self.install(file);
        }
        self.rebuild_index();
    }

    fn install(&mut self, file: File) {
        if file.tasks().is_empty() {
            self.files.remove(&file.path);
        } else {
            self.files.insert(file.path.clone(), file);
        }
    }

    fn rebuild_index(&mut self) {
        self.index.rebuild(&self.files, &self.resolver);
    }

    // Re-tokenize a file we edited ourselves: tasks are matched by line.
    fn parse_tracked(&self, staged: &File) -> File {
        let raws = self.tokenizer.parse(&staged.path, &staged.content);
        let ids = carry_ids(&raws, staged, |raw, task| task.line == raw.line);
        let missing = staged.tasks().len().saturating_sub(ids.iter().flatten().count());
        if missing > 0 {
            warn!(path = %staged.path, missing, "tasks lost their line after rewrite");
        }
        build_file(
            &staged.path,
            staged.content.clone(),
            raws,
            ids,
            Some(staged),
            self.config.cards.order_meta,
        )
    }

    // Tokenize text that may have been edited outside the board.
    fn parse_external(&self, path: &str, content: String, previous: Option<&File>) -> File {
        let raws = self.tokenizer.parse(path, &content);
        for raw in &raws {
            if let Some(value) = raw.meta.first(ORDER_KEY)
                && parse_order(value).is_none()
            {
                warn!(path, line = raw.line, value, "ignoring non-integer order");
            }
        }
        let ids = previous.map_or_else(
            || vec![None; raws.len()],
            |previous| {
                let mut ids = carry_ids(&raws, previous, |raw, task| {
                    task.line == raw.line && task.text == raw.text
                });
                let by_text = carry_ids(&raws, previous, |raw, task| task.text == raw.text);
                let mut used: HashSet<TaskId> = ids.iter().flatten().copied().collect();
                for (slot, candidate) in ids.iter_mut().zip(by_text) {
                    if slot.is_none()
                        && let Some(id) = candidate
                        && used.insert(id)
                    {
                        *slot = Some(id);
                    }
                }
                ids
            },
        );
        build_file(
            path,
            content,
            raws,
            ids,
            previous,
            self.config.cards.order_meta,
        )
    }
}

fn carry_ids<F>(raws: &[RawTask], previous: &File, matches: F) -> Vec<Option<TaskId>>
where
    F: Fn(&RawTask, &Task) -> bool,
{
    let mut used = HashSet::new();
    raws.iter()
        .map(|raw| {
            let found = previous
                .tasks()
                .iter()
                .find(|task| !used.contains(&task.id) && matches(raw, task))?;
            used.insert(found.id);
            Some(found.id)
        })
        .collect()
}

fn build_file(
    path: &str,
    content: String,
    raws: Vec<RawTask>,
    ids: Vec<Option<TaskId>>,
    previous: Option<&File>,
    order_meta: bool,
) -> File {
    let mut ids = ids.into_iter();
    let mut file = File::from_raw_tasks(path, content, raws, |_| {
        ids.next().flatten().unwrap_or_else(TaskId::new)
    });
    for task in &mut file.tasks {
        // In position mode rank follows the line; `order:` text is inert.
        if !order_meta {
            task.order = None;
        }
        // Session keys are not written in position mode; keep them in memory.
        if task.order.is_none()
            && let Some(previous) = previous
        {
            task.order = previous.task(task.id).and_then(|old| old.order);
        }
    }
    file
}

// Move each moved task's line next to its same-file neighbours in `desired`.
fn relocate_in_files(
    staged: &mut BTreeMap<String, File>,
    desired: &[TaskId],
    moving: &[TaskId],
) -> BoardResult<()> {
    for id in moving {
        let Some(file) = staged.values_mut().find(|file| file.task(*id).is_some()) else {
            continue;
        };
        let same_file: Vec<TaskId> = desired
            .iter()
            .copied()
            .filter(|candidate| file.task(*candidate).is_some())
            .collect();
        let Some(rank) = same_file.iter().position(|candidate| candidate == id) else {
            continue;
        };
        let line_of = |target: TaskId| file.task(target).map(|task| task.line);
        let Some(from) = line_of(*id) else {
            continue;
        };
        let prev = rank.checked_sub(1).and_then(|r| line_of(same_file[r]));
        let next = same_file.get(rank + 1).and_then(|next| line_of(*next));
        let to = match (prev, next) {
            (Some(prev), _) if from < prev => prev,
            (Some(prev), _) => prev + 1,
            (None, Some(next)) if from < next => next - 1,
            (None, Some(next)) => next,
            (None, None) => from,
        };
        if to != from {
            let path = file.path.clone();
            file.relocate_line(from, to)
                .map_err(|err| line_error(&path, err))?;
        }
    }
    Ok(())
}

fn render_touched(
    staged: &mut BTreeMap<String, File>,
    touched: &BTreeMap<String, BTreeSet<TaskId>>,
    syntax: &Syntax,
) -> BoardResult<()> {
    for (path, ids) in touched {
        if let Some(file) = staged.get_mut(path) {
            file.render_tasks(ids, syntax)
                .map_err(|err| line_error(path, err))?;
        }
    }
    Ok(())
}

fn line_error(path: &str, err: LineError) -> BoardError {
    BoardError::persistence(path, err)
}
