//! Domain types for tagboard: tasks found in text files and the syntax that
//! describes them.

/// Files and line-addressed editing.
pub mod file;
/// Predicate filters.
pub mod filter;
/// Identifier types.
pub mod id;
/// Inline tag syntax.
pub mod syntax;
/// Task model.
pub mod task;
/// Case-insensitive text search helpers.
pub mod text_matcher;
/// Task discovery.
pub mod tokenizer;

pub use file::{File, LineError, TextLines};
pub use filter::{TaskFilter, TaskFilterBuilder};
pub use id::TaskId;
pub use syntax::Syntax;
pub use task::{COMPLETED_KEY, Meta, ORDER_KEY, SourceKind, Task, TokenShape, compare_in_list};
pub use text_matcher::TextMatcher;
pub use tokenizer::{LineTokenizer, RawTask, Tokenizer, comment_lead};
