//! Mapping from list names to list membership.

use tagboard_core::{Syntax, Task, TaskFilter, compare_in_list};

use crate::config::ProjectConfig;
use crate::error::{BoardError, BoardResult};
use crate::filter_util::{FilterBuildResult, parse_filter};

/// How a list selects its tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListKind {
    /// Tasks whose list token names the list.
    Concrete,
    /// Tasks matching a predicate, across every list.
    Virtual(TaskFilter),
}

static CONCRETE: ListKind = ListKind::Concrete;

/// A configured list with its resolved kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardList {
    /// List name.
    pub name: String,
    /// Concrete or virtual.
    pub kind: ListKind,
    /// Hidden from board aggregates.
    pub ignore: bool,
}

impl BoardList {
    /// Whether the list is concrete.
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        matches!(self.kind, ListKind::Concrete)
    }
}

/// Resolves list names against the configured list sequence.
#[derive(Debug, Clone)]
pub struct ListResolver {
    lists: Vec<BoardList>,
    syntax: Syntax,
    default_list: Option<String>,
    done_list: Option<String>,
    doing_list: Option<String>,
}

impl ListResolver {
    /// Build a resolver, parsing virtual list filters.
    ///
    /// # Errors
    /// Returns an error if a list filter does not parse.
    pub fn new(config: &ProjectConfig) -> FilterBuildResult<Self> {
        let syntax = config.syntax();
        let lists = config
            .lists()
            .iter()
            .map(|list| {
                let kind = match &list.filter {
                    Some(query) => ListKind::Virtual(parse_filter(query, &syntax)?),
                    None => ListKind::Concrete,
                };
                Ok(BoardList {
                    name: list.name.clone(),
                    kind,
                    ignore: list.ignore,
                })
            })
            .collect::<FilterBuildResult<Vec<_>>>()?;

        let default_list = config
            .cards
            .default_list
            .clone()
            .or_else(|| lists.first().map(|list| list.name.clone()));
        let done_list = config.cards.done_list.clone().or_else(|| {
            lists
                .iter()
                .rev()
                .find(|list| list.is_concrete())
                .map(|list| list.name.clone())
        });
        let doing_list = config
            .cards
            .doing_list
            .clone()
            .or_else(|| default_doing_list(&lists));

        Ok(Self {
            lists,
            syntax,
            default_list,
            done_list,
            doing_list,
        })
    }

    /// Configured lists in board order.
    #[must_use]
    pub fn lists(&self) -> &[BoardList] {
        &self.lists
    }

    /// Tag syntax in effect.
    #[must_use]
    pub const fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Configured entry for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoardList> {
        self.lists.iter().find(|list| list.name == name)
    }

    /// Whether `name` is configured.
    #[must_use]
    pub fn list_exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether `name` is left out of board aggregates (unknown or flagged).
    #[must_use]
    pub fn ignore_list(&self, name: &str) -> bool {
        self.get(name).is_none_or(|list| list.ignore)
    }

    /// Whether bare `NAME:` comment tokens are recognised for `name`.
    #[must_use]
    pub fn include_list(&self, name: &str) -> bool {
        self.syntax.includes_list(name)
    }

    /// Kind of `name`; unconfigured names are concrete.
    #[must_use]
    pub fn kind(&self, name: &str) -> &ListKind {
        self.get(name).map_or(&CONCRETE, |list| &list.kind)
    }

    /// List receiving new cards.
    #[must_use]
    pub fn default_list(&self) -> Option<&str> {
        self.default_list.as_deref()
    }

    /// List that marks cards as completed.
    #[must_use]
    pub fn done_list(&self) -> Option<&str> {
        self.done_list.as_deref()
    }

    /// List that marks cards as in progress.
    #[must_use]
    pub fn doing_list(&self) -> Option<&str> {
        self.doing_list.as_deref()
    }

    /// Check that `name` can receive tasks.
    ///
    /// # Errors
    /// Returns [`BoardError::InvalidTarget`] for unknown and virtual lists.
    pub fn ensure_move_target(&self, name: &str) -> BoardResult<()> {
        match self.get(name) {
            None => Err(BoardError::invalid_target(name, "list is not configured")),
            Some(list) if !list.is_concrete() => Err(BoardError::invalid_target(
                name,
                "virtual lists are computed from a filter and cannot hold tasks",
            )),
            Some(_) => Ok(()),
        }
    }

    /// Ordered members of `name` among `tasks`.
    #[must_use]
    pub fn resolve<'a, I>(&self, name: &str, tasks: I) -> Vec<&'a Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut members: Vec<&Task> = match self.kind(name) {
            ListKind::Concrete => tasks.into_iter().filter(|task| task.list == name).collect(),
            ListKind::Virtual(filter) => tasks.into_iter().filter(|task| filter.matches(task)).collect(),
        };
        members.sort_by(|a, b| compare_in_list(a, b));
        members
    }
}

fn default_doing_list(lists: &[BoardList]) -> Option<String> {
    let concrete: Vec<&BoardList> = lists.iter().filter(|list| list.is_concrete()).collect();
    concrete
        .iter()
        .rev()
        .find(|list| {
            let lower = list.name.to_ascii_lowercase();
            lower.contains("doing") || lower.contains("progress")
        })
        .or_else(|| concrete.get(1))
        .map(|list| list.name.clone())
}
