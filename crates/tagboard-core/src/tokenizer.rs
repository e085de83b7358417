//! Discover tasks in file text.

use crate::syntax::{Syntax, is_list_name};
use crate::task::{Meta, SourceKind, TokenShape};

/// One task as found by a [`Tokenizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTask {
    /// 1-based line number.
    pub line: usize,
    /// List named by the token.
    pub list: String,
    /// Body text without meta words.
    pub text: String,
    /// Parsed `key:value` meta.
    pub meta: Meta,
    /// Markdown item or source-comment tag.
    pub source_kind: SourceKind,
    /// Verbatim text before the token.
    pub lead: String,
    /// Shape of the token.
    pub token: TokenShape,
    /// Verbatim text after the body.
    pub tail: String,
}

/// Parsing service that extracts tasks from a file's text.
pub trait Tokenizer {
    /// Syntax used both for parsing and for re-rendering task lines.
    fn syntax(&self) -> &Syntax;

    /// Extract every task in `text`, in line order.
    fn parse(&self, path: &str, text: &str) -> Vec<RawTask>;
}

const COMMENT_MARKERS: [&str; 7] = ["<!--", "//", "/*", "--", "#", ";", "*"];
const COMMENT_TERMINATORS: [&str; 2] = ["*/", "-->"];

/// Lead for a new comment task modelled on an existing task's `lead`.
///
/// Keeps the indentation and the comment marker that opens the tag, and
/// drops any code before the comment. An empty result means the token prefix
/// itself opens the comment (`#TODO` in shell or Python).
#[must_use]
pub fn comment_lead(lead: &str) -> String {
    let indent = &lead[..lead.len() - lead.trim_start().len()];
    let before_token = lead.trim_end();
    let spacing = &lead[before_token.len()..];
    COMMENT_MARKERS
        .iter()
        .filter(|marker| before_token.ends_with(*marker))
        .max_by_key(|marker| marker.len())
        .map_or_else(
            || indent.to_owned(),
            |marker| format!("{indent}{marker}{spacing}"),
        )
}

/// Line-oriented tokenizer for markdown items and comment tags.
#[derive(Debug, Clone, Default)]
pub struct LineTokenizer {
    syntax: Syntax,
}

impl LineTokenizer {
    /// Create a tokenizer for `syntax`.
    #[must_use]
    pub const fn new(syntax: Syntax) -> Self {
        Self { syntax }
    }

    fn parse_markdown(&self, line: &str) -> Option<(usize, TokenShape, String, usize)> {
        let indent = line.len() - line.trim_start().len();
        let mut rest = &line[indent..];
        for bullet in ["- ", "* ", "+ "] {
            if let Some(after) = rest.strip_prefix(bullet) {
                rest = after.trim_start();
                for checkbox in ["[ ]", "[x]", "[X]"] {
                    if let Some(after_box) = rest.strip_prefix(checkbox)
                        && after_box.starts_with(char::is_whitespace)
                    {
                        rest = after_box.trim_start();
                    }
                }
                break;
            }
        }
        let token_start = line.len() - rest.len();
        let (shape, list, token_len) = self.hash_token(rest)?;
        Some((token_start, shape, list, token_start + token_len))
    }

    fn parse_code(&self, line: &str) -> Option<(usize, TokenShape, String, usize)> {
        let mut search_from = 0;
        while search_from < line.len() {
            let (pos, marker) = COMMENT_MARKERS
                .iter()
                .filter_map(|marker| {
                    line.get(search_from..)
                        .and_then(|hay| hay.find(marker))
                        .map(|found| (search_from + found, *marker))
                })
                .min_by_key(|(pos, marker)| (*pos, usize::MAX - marker.len()))?;
            // `#TODO` in a `#` comment: the marker doubles as the token prefix.
            if marker == self.syntax.token_prefix()
                && let Some((shape, list, token_len)) = self.hash_token(&line[pos..])
            {
                return Some((pos, shape, list, pos + token_len));
            }
            // `*` only opens a block-comment continuation at line start.
            let opens_comment = marker != "*" || line[..pos].trim().is_empty();
            if opens_comment {
                let after_marker = pos + marker.len();
                let body = &line[after_marker..];
                let rest = body.trim_start();
                let token_start = line.len() - rest.len();
                if let Some((shape, list, token_len)) = self
                    .hash_token(rest)
                    .or_else(|| self.bare_token(rest))
                {
                    return Some((token_start, shape, list, token_start + token_len));
                }
            }
            search_from = pos + marker.len();
        }
        None
    }

    fn hash_token(&self, rest: &str) -> Option<(TokenShape, String, usize)> {
        let prefix = self.syntax.token_prefix();
        if prefix.is_empty() {
            return None;
        }
        let after = rest.strip_prefix(prefix)?;
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        if !is_list_name(name) {
            return None;
        }
        let tail = &after[name_len..];
        let (shape, extra) = if tail.starts_with(':') {
            (TokenShape::HashColon, 1)
        } else {
            (TokenShape::Hash, 0)
        };
        let after_token = &tail[extra..];
        if !after_token.is_empty() && !after_token.starts_with(char::is_whitespace) {
            return None;
        }
        Some((shape, name.to_owned(), prefix.len() + name_len + extra))
    }

    fn bare_token(&self, rest: &str) -> Option<(TokenShape, String, usize)> {
        let (name, after) = rest.split_once(':')?;
        if !self.syntax.includes_list(name) {
            return None;
        }
        if !after.is_empty() && !after.starts_with(char::is_whitespace) {
            return None;
        }
        Some((TokenShape::Bare, name.to_owned(), name.len() + 1))
    }

    fn split_body(&self, body: &str) -> (String, Meta) {
        let mut words = Vec::new();
        let mut meta = Meta::new();
        for word in body.split_whitespace() {
            if let Some((key, value)) = self.syntax.split_meta(word) {
                meta.push(key, value);
            } else {
                words.push(word);
            }
        }
        (words.join(" "), meta)
    }
}

fn split_tail(body: &str) -> (&str, &str) {
    let trimmed = body.trim_end();
    for terminator in COMMENT_TERMINATORS {
        if let Some(inner) = trimmed.strip_suffix(terminator) {
            let inner_trimmed = inner.trim_end();
            return (inner_trimmed, &body[inner_trimmed.len()..]);
        }
    }
    (body, "")
}

impl Tokenizer for LineTokenizer {
    fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    fn parse(&self, path: &str, text: &str) -> Vec<RawTask> {
        let source_kind = SourceKind::from_path(path);
        text.lines()
            .enumerate()
            .filter_map(|(idx, line)| {
                let (token_start, token, list, body_start) = match source_kind {
                    SourceKind::Markdown => self.parse_markdown(line),
                    SourceKind::Code => self.parse_code(line),
                }?;
                let (body, tail) = match source_kind {
                    SourceKind::Code => split_tail(&line[body_start..]),
                    SourceKind::Markdown => (&line[body_start..], ""),
                };
                let (text, meta) = self.split_body(body);
                Some(RawTask {
                    line: idx + 1,
                    list,
                    text,
                    meta,
                    source_kind,
                    lead: line[..token_start].to_owned(),
                    token,
                    tail: tail.trim_end().to_owned(),
                })
            })
            .collect()
    }
}
