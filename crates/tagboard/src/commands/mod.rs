use std::io::Write;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tagboard_app::{AddTask, FileStore, ListView, Repository, parse_filter};
use tagboard_core::{Meta, Task, TaskFilter, TaskId};

use crate::{Command, LsFormat};

/// Execute a parsed command against a loaded board.
pub fn run<S: FileStore>(
    command: Command,
    repo: &mut Repository<S>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Ls { filter, format } => {
            let syntax = repo.resolver().syntax().clone();
            let filter = filter
                .as_deref()
                .map(|query| parse_filter(query, &syntax))
                .transpose()
                .context("Invalid filter")?
                .unwrap_or_default();
            let lists = visible_lists(repo, &filter);

            if lists.iter().all(|list| list.tasks.is_empty()) {
                if filter.is_empty() {
                    writeln!(out, "No tasks found")?;
                } else {
                    writeln!(out, "No tasks matched the provided filter")?;
                }
                return Ok(());
            }

            match format {
                LsFormat::Table => render_lists(out, &lists)?,
                LsFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&lists)?)?,
            }
        }
        Command::Add { text, list, file } => {
            let task = repo.add_task_to_file(AddTask {
                path: file,
                list,
                text,
                meta: Meta::new(),
            })?;
            writeln!(
                out,
                "added {}:{} to {}: {}",
                task.file_path, task.line, task.list, task.text
            )?;
        }
        Command::Mv { list, tasks, pos } => {
            let ids = tasks
                .iter()
                .map(|raw| resolve_task_ref(repo, raw))
                .collect::<Result<Vec<_>>>()?;
            let pos = pos.unwrap_or_else(|| repo.tasks_in_list(&list).len());
            let outcome = repo.move_tasks(&ids, &list, pos)?;

            if outcome.is_noop() {
                writeln!(out, "nothing to move")?;
                return Ok(());
            }
            writeln!(out, "moved {} task(s) to {list}", outcome.moved.len())?;
            for path in &outcome.changed_paths {
                writeln!(out, "updated {path}")?;
            }
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    name: &'a str,
    tasks: Vec<&'a Task>,
}

fn visible_lists<'a, S: FileStore>(
    repo: &'a Repository<S>,
    filter: &TaskFilter,
) -> Vec<ListOutput<'a>> {
    repo.lists()
        .into_iter()
        .map(|ListView { list, tasks }| ListOutput {
            name: &list.name,
            tasks: tasks
                .into_iter()
                .filter(|task| filter.is_empty() || filter.matches(task))
                .collect(),
        })
        .collect()
}

fn render_lists(out: &mut impl Write, lists: &[ListOutput<'_>]) -> Result<()> {
    for list in lists {
        writeln!(out, "{} ({})", list.name, list.tasks.len())?;
        for task in &list.tasks {
            let order = task
                .order
                .map_or_else(|| "-".to_owned(), |key| key.to_string());
            writeln!(
                out,
                "  {}:{} | {} | {}",
                task.file_path, task.line, order, task.text
            )?;
        }
    }
    Ok(())
}

/// Resolve `path:line` to the task on that line.
fn resolve_task_ref<S: FileStore>(repo: &Repository<S>, raw: &str) -> Result<TaskId> {
    let (path, line) = raw
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("Invalid task reference (expected path:line): {raw}"))?;
    let line: usize = line
        .parse()
        .with_context(|| format!("Invalid line number in task reference: {raw}"))?;
    repo.find_task_at(path, line)
        .map(|task| task.id)
        .ok_or_else(|| anyhow!("No task at {path}:{line}"))
}
