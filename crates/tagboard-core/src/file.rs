//! Files and line-addressed editing.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::id::TaskId;
use crate::syntax::Syntax;
use crate::task::{SourceKind, Task};
use crate::tokenizer::RawTask;

/// Errors raised by line-addressed edits.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineError {
    /// The 1-based line number is outside the buffer.
    #[error("line {line} is out of range (file has {len} lines)")]
    OutOfRange {
        /// Requested line.
        line: usize,
        /// Number of lines in the buffer.
        len: usize,
    },
}

/// An ordered sequence of tasks plus the text they were parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    /// Identity key, relative to the store root.
    pub path: String,
    /// Current text.
    #[serde(skip)]
    pub content: String,
    /// Tasks in line order.
    pub tasks: Vec<Task>,
}

impl File {
    /// Build a file from tokenizer output, minting ids through `assign_id`.
    pub fn from_raw_tasks<F>(path: &str, content: String, raws: Vec<RawTask>, mut assign_id: F) -> Self
    where
        F: FnMut(&RawTask) -> TaskId,
    {
        let mut tasks: Vec<Task> = raws
            .into_iter()
            .map(|raw| {
                let id = assign_id(&raw);
                Task::from_raw(id, path, raw)
            })
            .collect();
        tasks.sort_by_key(|task| task.line);
        Self {
            path: path.to_owned(),
            content,
            tasks,
        }
    }

    /// Tasks in line order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Markdown or source file.
    #[must_use]
    pub fn source_kind(&self) -> SourceKind {
        SourceKind::from_path(&self.path)
    }

    /// Look up a task by id.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Mutable lookup by id.
    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Task starting on `line`.
    #[must_use]
    pub fn task_at_line(&self, line: usize) -> Option<&Task> {
        self.tasks.iter().find(|task| task.line == line)
    }

    /// Move the line at `from` so it ends up at `to`, shifting task lines.
    ///
    /// # Errors
    /// Returns [`LineError::OutOfRange`] when either line is outside the file.
    pub fn relocate_line(&mut self, from: usize, to: usize) -> Result<(), LineError> {
        let mut lines = TextLines::parse(&self.content);
        lines.move_line(from, to)?;
        self.content = lines.to_string();
        for task in &mut self.tasks {
            task.line = shifted_line(task.line, from, to);
        }
        self.tasks.sort_by_key(|task| task.line);
        Ok(())
    }

    /// Insert `body` as a new line at `line`, shifting the tasks below it.
    ///
    /// # Errors
    /// Returns [`LineError::OutOfRange`] when `line` is not in `1..=len + 1`.
    pub fn insert_line(&mut self, line: usize, body: &str) -> Result<(), LineError> {
        let mut lines = TextLines::parse(&self.content);
        lines.insert(line, body)?;
        self.content = lines.to_string();
        for task in &mut self.tasks {
            if task.line >= line {
                task.line += 1;
            }
        }
        Ok(())
    }

    /// Re-render the lines of the tasks in `ids` from their current fields.
    ///
    /// # Errors
    /// Returns [`LineError::OutOfRange`] when a task's line is outside the file.
    pub fn render_tasks(&mut self, ids: &BTreeSet<TaskId>, syntax: &Syntax) -> Result<(), LineError> {
        let mut lines = TextLines::parse(&self.content);
        for task in self.tasks.iter().filter(|task| ids.contains(&task.id)) {
            lines.replace(task.line, &task.render_line(syntax))?;
        }
        self.content = lines.to_string();
        Ok(())
    }
}

fn shifted_line(line: usize, from: usize, to: usize) -> usize {
    if line == from {
        to
    } else if from < to && line > from && line <= to {
        line - 1
    } else if to < from && line >= to && line < from {
        line + 1
    } else {
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    body: String,
    ending: &'static str,
}

/// Line buffer that remembers each line's own terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLines {
    lines: Vec<Line>,
}

impl TextLines {
    /// Split `text` into lines, keeping `\n`, `\r\n` or no terminator per line.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lines = text
            .split_inclusive('\n')
            .map(|raw| {
                if let Some(body) = raw.strip_suffix("\r\n") {
                    Line {
                        body: body.to_owned(),
                        ending: "\r\n",
                    }
                } else if let Some(body) = raw.strip_suffix('\n') {
                    Line {
                        body: body.to_owned(),
                        ending: "\n",
                    }
                } else {
                    Line {
                        body: raw.to_owned(),
                        ending: "",
                    }
                }
            })
            .collect();
        Self { lines }
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the buffer holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Body of the 1-based `line`, without terminator.
    #[must_use]
    pub fn get(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(|l| l.body.as_str())
    }

    /// Replace the body of `line`, keeping its terminator.
    ///
    /// # Errors
    /// Returns [`LineError::OutOfRange`] when `line` is outside the buffer.
    pub fn replace(&mut self, line: usize, body: &str) -> Result<(), LineError> {
        let idx = self.index(line)?;
        if let Some(slot) = self.lines.get_mut(idx) {
            body.clone_into(&mut slot.body);
        }
        Ok(())
    }

    /// Insert a new line so that it becomes `line` (`len + 1` appends).
    ///
    /// # Errors
    /// Returns [`LineError::OutOfRange`] when `line` is not in `1..=len + 1`.
    pub fn insert(&mut self, line: usize, body: &str) -> Result<(), LineError> {
        if line == 0 || line > self.lines.len() + 1 {
            return Err(self.out_of_range(line));
        }
        let trailing_newline = self.has_trailing_newline();
        self.lines.insert(
            line - 1,
            Line {
                body: body.to_owned(),
                ending: "",
            },
        );
        self.normalize_endings(trailing_newline);
        Ok(())
    }

    /// Move `from` so it becomes line `to`.
    ///
    /// # Errors
    /// Returns [`LineError::OutOfRange`] when either line is outside the buffer.
    pub fn move_line(&mut self, from: usize, to: usize) -> Result<(), LineError> {
        let from_idx = self.index(from)?;
        let to_idx = self.index(to)?;
        if from_idx == to_idx {
            return Ok(());
        }
        let trailing_newline = self.has_trailing_newline();
        let line = self.lines.remove(from_idx);
        self.lines.insert(to_idx, line);
        self.normalize_endings(trailing_newline);
        Ok(())
    }

    fn index(&self, line: usize) -> Result<usize, LineError> {
        match line.checked_sub(1) {
            Some(idx) if idx < self.lines.len() => Ok(idx),
            _ => Err(self.out_of_range(line)),
        }
    }

    const fn out_of_range(&self, line: usize) -> LineError {
        LineError::OutOfRange {
            line,
            len: self.lines.len(),
        }
    }

    fn has_trailing_newline(&self) -> bool {
        self.lines.last().is_none_or(|line| !line.ending.is_empty())
    }

    fn default_ending(&self) -> &'static str {
        self.lines
            .iter()
            .map(|line| line.ending)
            .find(|ending| !ending.is_empty())
            .unwrap_or("\n")
    }

    // Every line but the last needs a terminator; the last keeps the file's
    // original trailing-newline convention.
    fn normalize_endings(&mut self, trailing_newline: bool) {
        let default = self.default_ending();
        let last = self.lines.len().saturating_sub(1);
        for (idx, line) in self.lines.iter_mut().enumerate() {
            if idx == last && !trailing_newline {
                line.ending = "";
            } else if line.ending.is_empty() {
                line.ending = default;
            }
        }
    }
}

impl fmt::Display for TextLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(&line.body)?;
            f.write_str(line.ending)?;
        }
        Ok(())
    }
}
