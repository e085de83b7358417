//! Parsing of filter queries into [`TaskFilter`] values.

use tagboard_core::syntax::{Syntax, is_list_name, is_meta_key};
use tagboard_core::{TaskFilter, TaskFilterBuilder};
use thiserror::Error;

/// Error type returned while constructing task filters from user-facing inputs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterBuildError {
    /// A clause such as `list:` or `!` has nothing after its operator.
    #[error("empty filter clause: {token}")]
    EmptyClause {
        /// The clause as written.
        token: String,
    },
    /// A `list:` clause names something that cannot be a list.
    #[error("invalid list name in filter: {name}")]
    InvalidList {
        /// Rejected list name.
        name: String,
    },
    /// A meta clause uses a key that cannot appear in a task line.
    #[error("invalid meta key in filter: {key}")]
    InvalidKey {
        /// Rejected meta key.
        key: String,
    },
}

/// Result alias for filter construction helpers.
pub type FilterBuildResult<T> = Result<T, FilterBuildError>;

const LIST_CLAUSE: &str = "list";
const ANY_VALUE: &str = "*";

/// Parse a whitespace-separated filter query into a [`TaskFilter`].
///
/// Clauses:
/// - `list:A,B` allows either list;
/// - `+tag` (the configured tag prefix) and `@context` words are required;
/// - `key:value` requires the value (`key:*` only requires the key);
/// - `!key` requires the key to be absent;
/// - any other word is part of the case-insensitive text search.
///
/// `=` is accepted in place of `:` for clauses.
///
/// # Errors
/// Returns an error for empty clauses and invalid list names or meta keys.
pub fn parse_filter(query: &str, syntax: &Syntax) -> FilterBuildResult<TaskFilter> {
    let mut builder = TaskFilterBuilder::new();
    let mut text = Vec::new();

    for token in query.split_whitespace() {
        if let Some(key) = token.strip_prefix('!') {
            ensure_key(key, token)?;
            builder = builder.meta_absent(key);
            continue;
        }
        if is_prefixed_word(token, syntax.tag_prefix()) {
            builder = builder.tags([token]);
            continue;
        }
        if is_prefixed_word(token, "@") {
            builder = builder.contexts([token]);
            continue;
        }
        let Some((key, value)) = split_clause(token) else {
            text.push(token);
            continue;
        };
        if !is_meta_key(key) || value.starts_with('/') {
            text.push(token);
            continue;
        }
        if value.is_empty() {
            return Err(FilterBuildError::EmptyClause {
                token: token.to_owned(),
            });
        }
        if key == LIST_CLAUSE {
            let names = value.split(',').filter(|name| !name.is_empty());
            let mut lists = Vec::new();
            for name in names {
                if !is_list_name(name) {
                    return Err(FilterBuildError::InvalidList {
                        name: name.to_owned(),
                    });
                }
                lists.push(name);
            }
            builder = builder.lists(lists);
        } else if value == ANY_VALUE {
            builder = builder.meta_present(key);
        } else {
            builder = builder.meta_value(key, value);
        }
    }

    Ok(builder.text(&text.join(" ")).build())
}

fn split_clause(token: &str) -> Option<(&str, &str)> {
    let idx = token.find([':', '='])?;
    let key = &token[..idx];
    // `key::value` under the double-colon syntax.
    let value = token[idx + 1..].trim_start_matches(':');
    Some((key, value))
}

fn ensure_key(key: &str, token: &str) -> FilterBuildResult<()> {
    if key.is_empty() {
        return Err(FilterBuildError::EmptyClause {
            token: token.to_owned(),
        });
    }
    if !is_meta_key(key) {
        return Err(FilterBuildError::InvalidKey { key: key.to_owned() });
    }
    Ok(())
}

fn is_prefixed_word(token: &str, prefix: &str) -> bool {
    !prefix.is_empty() && token.len() > prefix.len() && token.starts_with(prefix)
}
