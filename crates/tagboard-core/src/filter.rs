//! Predicate filters over tasks.

use std::collections::{BTreeMap, BTreeSet};

use crate::task::Task;
use crate::text_matcher::TextMatcher;

/// Conjunction of simple predicates over a [`Task`].
///
/// Every non-empty clause must hold. Within `lists` and within each meta
/// key's allowed values, any entry may match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Allowed lists (logical OR).
    pub lists: BTreeSet<String>,
    /// Required tag words including their prefix, e.g. `+ui` (logical AND).
    pub tags: BTreeSet<String>,
    /// Required context words including `@` (logical AND).
    pub contexts: BTreeSet<String>,
    /// Meta keys that must be present; a non-empty set restricts the value.
    pub meta: BTreeMap<String, BTreeSet<String>>,
    /// Meta keys that must be absent.
    pub meta_absent: BTreeSet<String>,
    /// Case-insensitive substring over text, path and meta values.
    pub text: Option<TextMatcher>,
}

impl TaskFilter {
    /// Start building a filter.
    #[must_use]
    pub fn builder() -> TaskFilterBuilder {
        TaskFilterBuilder::new()
    }

    /// Whether the filter has no clauses and therefore matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
            && self.tags.is_empty()
            && self.contexts.is_empty()
            && self.meta.is_empty()
            && self.meta_absent.is_empty()
            && self.text.is_none()
    }

    /// Evaluate the filter against `task`.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if !self.lists.is_empty() && !self.lists.contains(&task.list) {
            return false;
        }
        if !words_present(task, &self.tags) || !words_present(task, &self.contexts) {
            return false;
        }
        let meta_ok = self.meta.iter().all(|(key, allowed)| {
            task.meta.get(key).is_some_and(|values| {
                allowed.is_empty() || values.iter().any(|value| allowed.contains(value))
            })
        });
        if !meta_ok {
            return false;
        }
        if self.meta_absent.iter().any(|key| task.meta.contains_key(key)) {
            return false;
        }
        self.text.as_ref().is_none_or(|matcher| matcher.matches(task))
    }
}

fn words_present(task: &Task, required: &BTreeSet<String>) -> bool {
    required
        .iter()
        .all(|word| task.text.split_whitespace().any(|candidate| candidate == word))
}

/// Fluent builder for [`TaskFilter`].
#[derive(Debug, Clone, Default)]
pub struct TaskFilterBuilder {
    filter: TaskFilter,
}

impl TaskFilterBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow tasks in any of `lists`.
    #[must_use]
    pub fn lists<I, S>(mut self, lists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.lists.extend(lists.into_iter().map(Into::into));
        self
    }

    /// Require every tag word in `tags`.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Require every context word in `contexts`.
    #[must_use]
    pub fn contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.contexts.extend(contexts.into_iter().map(Into::into));
        self
    }

    /// Require `key` to be present.
    #[must_use]
    pub fn meta_present(mut self, key: impl Into<String>) -> Self {
        self.filter.meta.entry(key.into()).or_default();
        self
    }

    /// Require `key` to carry `value` (values of the same key are OR-ed).
    #[must_use]
    pub fn meta_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter
            .meta
            .entry(key.into())
            .or_default()
            .insert(value.into());
        self
    }

    /// Require `key` to be absent.
    #[must_use]
    pub fn meta_absent(mut self, key: impl Into<String>) -> Self {
        self.filter.meta_absent.insert(key.into());
        self
    }

    /// Substring search; blank input clears the clause.
    #[must_use]
    pub fn text(mut self, query: &str) -> Self {
        self.filter.text = TextMatcher::new(query);
        self
    }

    /// Finish the filter.
    #[must_use]
    pub fn build(self) -> TaskFilter {
        self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TaskId;
    use crate::task::{Meta, SourceKind, TokenShape};

    fn task(list: &str, text: &str, meta: &[(&str, &str)]) -> Task {
        Task {
            id: TaskId::new(),
            file_path: "TODO.md".into(),
            line: 1,
            list: list.into(),
            text: text.into(),
            meta: meta.iter().copied().collect::<Meta>(),
            order: None,
            source_kind: SourceKind::Markdown,
            lead: String::new(),
            token: TokenShape::Hash,
            tail: String::new(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = TaskFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&task("DONE", "anything", &[])));
    }

    #[test]
    fn lists_are_ored_and_tags_are_anded() {
        let filter = TaskFilter::builder()
            .lists(["TODO", "DOING"])
            .tags(["+ui", "+bug"])
            .build();
        assert!(filter.matches(&task("DOING", "Fix button +ui +bug", &[])));
        assert!(!filter.matches(&task("DOING", "Fix button +ui", &[])));
        assert!(!filter.matches(&task("DONE", "Fix button +ui +bug", &[])));
    }

    #[test]
    fn meta_presence_values_and_absence() {
        let filter = TaskFilter::builder()
            .meta_value("owner", "alice")
            .meta_value("owner", "bob")
            .meta_present("due")
            .meta_absent("blocked")
            .build();
        assert!(filter.matches(&task("TODO", "x", &[("owner", "bob"), ("due", "friday")])));
        assert!(!filter.matches(&task("TODO", "x", &[("owner", "carol"), ("due", "friday")])));
        assert!(!filter.matches(&task("TODO", "x", &[("owner", "bob")])));
        assert!(!filter.matches(&task(
            "TODO",
            "x",
            &[("owner", "bob"), ("due", "friday"), ("blocked", "yes")]
        )));
    }

    #[test]
    fn contexts_and_text_clauses() {
        let filter = TaskFilter::builder().contexts(["@home"]).text("PAINT").build();
        assert!(filter.matches(&task("TODO", "Paint fence @home", &[])));
        assert!(!filter.matches(&task("TODO", "Paint fence @work", &[])));
        assert!(TaskFilter::builder().text("  ").build().is_empty());
    }
}
