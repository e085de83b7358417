//! Inline tag syntax shared by the tokenizer and the line renderer.

use std::collections::BTreeSet;

/// Single colon meta separator (`key:value`).
pub const COLON: &str = ":";
/// Double colon meta separator (`key::value`).
pub const DOUBLE_COLON: &str = "::";

const META_SEPS: [&str; 2] = [COLON, DOUBLE_COLON];

/// Lists recognised as bare `NAME:` tokens inside source comments.
pub const DEFAULT_INCLUDE_LISTS: [&str; 12] = [
    "TODO", "DOING", "DONE", "PLANNING", "FIXME", "ARCHIVE", "HACK", "CHANGED", "XXX", "IDEA",
    "NOTE", "REVIEW",
];

/// Tag syntax options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    meta_sep: String,
    tag_prefix: String,
    token_prefix: String,
    include_lists: BTreeSet<String>,
}

impl Default for Syntax {
    fn default() -> Self {
        Self::new(COLON, "+", "#")
    }
}

impl Syntax {
    /// Build a syntax; an unsupported meta separator falls back to `:`.
    #[must_use]
    pub fn new(meta_sep: &str, tag_prefix: &str, token_prefix: &str) -> Self {
        let meta_sep = if META_SEPS.contains(&meta_sep) {
            meta_sep
        } else {
            COLON
        };
        Self {
            meta_sep: meta_sep.to_owned(),
            tag_prefix: tag_prefix.to_owned(),
            token_prefix: token_prefix.to_owned(),
            include_lists: DEFAULT_INCLUDE_LISTS.iter().map(|&name| name.to_owned()).collect(),
        }
    }

    /// Replace the set of lists recognised as bare comment tokens.
    #[must_use]
    pub fn with_include_lists<I, S>(mut self, lists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_lists = lists.into_iter().map(Into::into).collect();
        self
    }

    /// Separator between a meta key and its value.
    #[must_use]
    pub fn meta_sep(&self) -> &str {
        &self.meta_sep
    }

    /// Prefix marking a `+tag` word.
    #[must_use]
    pub fn tag_prefix(&self) -> &str {
        &self.tag_prefix
    }

    /// Prefix marking a `#LIST` token.
    #[must_use]
    pub fn token_prefix(&self) -> &str {
        &self.token_prefix
    }

    /// Whether `NAME:` inside a source comment denotes a task in list `NAME`.
    #[must_use]
    pub fn includes_list(&self, name: &str) -> bool {
        self.include_lists.contains(name)
    }

    /// Split a body word into a meta `(key, value)` pair.
    #[must_use]
    pub fn split_meta<'a>(&self, word: &'a str) -> Option<(&'a str, &'a str)> {
        let (key, value) = word.split_once(self.meta_sep.as_str())?;
        if !is_meta_key(key) || value.is_empty() {
            return None;
        }
        // `http://…` and `a::b` under a single-colon separator are prose.
        if value.starts_with('/') || value.starts_with(':') {
            return None;
        }
        Some((key, value))
    }
}

/// Whether `key` is usable as a meta key (`[A-Za-z][A-Za-z0-9_.-]*`).
#[must_use]
pub fn is_meta_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Whether `name` is usable as a list token (`[A-Za-z][A-Za-z0-9_-]*`).
#[must_use]
pub fn is_list_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_meta_separator_falls_back_to_colon() {
        let syntax = Syntax::new("=", "+", "#");
        assert_eq!(syntax.meta_sep(), COLON);
        let syntax = Syntax::new(DOUBLE_COLON, "+", "#");
        assert_eq!(syntax.meta_sep(), DOUBLE_COLON);
    }

    #[test]
    fn split_meta_rejects_urls_and_bad_keys() {
        let syntax = Syntax::default();
        assert_eq!(syntax.split_meta("story:3"), Some(("story", "3")));
        assert_eq!(syntax.split_meta("due.date:2025-01-01"), Some(("due.date", "2025-01-01")));
        assert_eq!(syntax.split_meta("https://example.com"), None);
        assert_eq!(syntax.split_meta("3:4"), None);
        assert_eq!(syntax.split_meta("key:"), None);
        assert_eq!(syntax.split_meta("a::b"), None);
    }

    #[test]
    fn double_colon_separator_splits_on_pair() {
        let syntax = Syntax::new(DOUBLE_COLON, "+", "#");
        assert_eq!(syntax.split_meta("story::3"), Some(("story", "3")));
        assert_eq!(syntax.split_meta("story:3"), None);
    }

    #[test]
    fn include_lists_can_be_replaced() {
        let syntax = Syntax::default().with_include_lists(["BUG"]);
        assert!(syntax.includes_list("BUG"));
        assert!(!syntax.includes_list("TODO"));
    }

    #[test]
    fn list_names_must_start_with_a_letter() {
        assert!(is_list_name("TODO"));
        assert!(is_list_name("in-progress"));
        assert!(!is_list_name("1TODO"));
        assert!(!is_list_name(""));
        assert!(!is_list_name("TO DO"));
    }
}
