//! Task model and single-line rendering.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::id::TaskId;
use crate::syntax::Syntax;
use crate::tokenizer::RawTask;

/// Meta key holding the persisted order key.
pub const ORDER_KEY: &str = "order";
/// Meta key holding the completion timestamp.
pub const COMPLETED_KEY: &str = "completed";

/// Kind of file a task was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Markdown/plain-text item.
    Markdown,
    /// Tag inside a source-code comment.
    Code,
}

impl SourceKind {
    /// Classify a path by its extension.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("md" | "markdown" | "mdx" | "txt") => Self::Markdown,
            _ => Self::Code,
        }
    }
}

/// Shape of the list token on a task line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenShape {
    /// `#LIST`
    Hash,
    /// `#LIST:`
    HashColon,
    /// `LIST:` (source comments only)
    Bare,
}

impl TokenShape {
    /// Render the token for `list`.
    #[must_use]
    pub fn render(self, list: &str, syntax: &Syntax) -> String {
        match self {
            Self::Hash => format!("{}{list}", syntax.token_prefix()),
            Self::HashColon => format!("{}{list}:", syntax.token_prefix()),
            Self::Bare => format!("{list}:"),
        }
    }
}

/// Tag name to ordered values, parsed from inline `key:value` words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meta(BTreeMap<String, Vec<String>>);

impl Meta {
    /// Empty meta map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Values recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// First value recorded for `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// Whether `key` carries at least one value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Append a value to `key`.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Replace every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    /// Drop `key` entirely.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.remove(key)
    }

    /// Iterate over `(key, values)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Whether no meta is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Meta {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = Self::new();
        for (key, value) in iter {
            meta.push(key, value);
        }
        meta
    }
}

/// A unit of work found on one line of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Surrogate identity.
    pub id: TaskId,
    /// Path of the owning file, relative to the store root.
    pub file_path: String,
    /// 1-based line within the owning file at the last parse.
    pub line: usize,
    /// Current list.
    pub list: String,
    /// Human-readable content without meta words.
    pub text: String,
    /// Inline `key:value` meta.
    pub meta: Meta,
    /// Order key within the list; `None` means ranked by file position.
    pub order: Option<i64>,
    /// Markdown item or source-comment tag.
    pub source_kind: SourceKind,
    /// Verbatim text before the list token.
    #[serde(skip)]
    pub lead: String,
    /// Token shape used when re-rendering.
    #[serde(skip)]
    pub token: TokenShape,
    /// Verbatim text after the body (comment terminators).
    #[serde(skip)]
    pub tail: String,
}

impl Task {
    /// Build a task from tokenizer output.
    #[must_use]
    pub fn from_raw(id: TaskId, file_path: &str, raw: RawTask) -> Self {
        let order = raw.meta.first(ORDER_KEY).and_then(parse_order);
        Self {
            id,
            file_path: file_path.to_owned(),
            line: raw.line,
            list: raw.list,
            text: raw.text,
            meta: raw.meta,
            order,
            source_kind: raw.source_kind,
            lead: raw.lead,
            token: raw.token,
            tail: raw.tail,
        }
    }

    /// Whether the order key is written into the line as `order:` meta.
    #[must_use]
    pub fn has_persisted_order(&self) -> bool {
        self.meta.contains_key(ORDER_KEY)
    }

    /// Set the order key, persisting it as meta only when `persist` is set.
    pub fn set_order(&mut self, order: Option<i64>, persist: bool) {
        self.order = order;
        match order {
            Some(key) if persist => self.meta.set(ORDER_KEY, key.to_string()),
            _ => {
                self.meta.remove(ORDER_KEY);
            }
        }
    }

    /// `+tag` words in the text, without their prefix.
    #[must_use]
    pub fn tags(&self, syntax: &Syntax) -> Vec<String> {
        prefixed_words(&self.text, syntax.tag_prefix())
    }

    /// `@context` words in the text, without their prefix.
    #[must_use]
    pub fn contexts(&self) -> Vec<String> {
        prefixed_words(&self.text, "@")
    }

    /// Render the full line for this task (without line terminator).
    #[must_use]
    pub fn render_line(&self, syntax: &Syntax) -> String {
        let mut line = self.lead.clone();
        line.push_str(&self.token.render(&self.list, syntax));
        let mut words: Vec<String> = self
            .text
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        for (key, values) in self.meta.iter() {
            for value in values {
                words.push(format!("{key}{}{value}", syntax.meta_sep()));
            }
        }
        if !words.is_empty() {
            line.push(' ');
            line.push_str(&words.join(" "));
        }
        line.push_str(&self.tail);
        line
    }
}

/// Parse a persisted order value; non-integer values are ignored.
#[must_use]
pub fn parse_order(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// Ordering of tasks inside one list.
///
/// Keyed tasks come first by key, then unkeyed tasks; ties fall back to
/// `(file_path, line)`.
#[must_use]
pub fn compare_in_list(a: &Task, b: &Task) -> Ordering {
    let by_key = match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_key
        .then_with(|| a.file_path.cmp(&b.file_path))
        .then_with(|| a.line.cmp(&b.line))
}

fn prefixed_words(text: &str, prefix: &str) -> Vec<String> {
    if prefix.is_empty() {
        return Vec::new();
    }
    text.split_whitespace()
        .filter_map(|word| word.strip_prefix(prefix))
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}
