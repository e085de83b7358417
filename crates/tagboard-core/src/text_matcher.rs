use crate::task::Task;

/// Case-insensitive substring matcher for task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    /// The normalized query.
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Determine whether the text, the file path, or any meta value contains the query.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_field(&task.text)
            || self.matches_field(&task.file_path)
            || task
                .meta
                .iter()
                .any(|(_, values)| values.iter().any(|value| self.matches_field(value)))
    }

    fn matches_field(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TaskId;
    use crate::task::{Meta, SourceKind, TokenShape};

    fn task() -> Task {
        Task {
            id: TaskId::new(),
            file_path: "docs/Roadmap.md".into(),
            line: 4,
            list: "TODO".into(),
            text: "Improve CLI output".into(),
            meta: [("owner", "Alice")].into_iter().collect(),
            order: None,
            source_kind: SourceKind::Markdown,
            lead: String::new(),
            token: TokenShape::Hash,
            tail: String::new(),
        }
    }

    #[test]
    fn matcher_skips_blank_queries() {
        assert!(TextMatcher::new("").is_none());
        assert!(TextMatcher::new("   ").is_none());
        assert!(TextMatcher::new("\n").is_none());
    }

    #[test]
    fn matcher_finds_text_across_fields() {
        let task = task();
        for query in ["cli", "roadmap", "alice"] {
            let matcher = TextMatcher::new(query)
                .unwrap_or_else(|| panic!("matcher must exist for queries with content"));
            assert!(matcher.matches(&task), "{query} should match");
        }
    }

    #[test]
    fn matcher_respects_case_insensitive_search() {
        let mut task = task();
        task.meta = Meta::new();

        let matcher =
            TextMatcher::new("CLI").unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(matcher.matches(&task));

        let missing =
            TextMatcher::new("alice").unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(!missing.matches(&task));
    }
}
