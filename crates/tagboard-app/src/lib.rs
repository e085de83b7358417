//! Board layer for tagboard.
//!
//! Loads task files through a [`FileStore`], groups tasks into configured
//! lists, and implements the move, modify, and add operations that rewrite
//! task lines in place.

pub mod async_repository;
pub mod board_index;
pub mod config;
pub mod error;
pub mod filter_util;
pub mod list_resolver;
pub mod order;
pub mod repository;
pub mod store;

pub use async_repository::AsyncRepository;
pub use board_index::BoardIndex;
pub use config::{CardsConfig, CodeConfig, ListConfig, ProjectConfig};
pub use error::{BoardError, BoardResult};
pub use filter_util::{FilterBuildError, FilterBuildResult, parse_filter};
pub use list_resolver::{BoardList, ListKind, ListResolver};
pub use order::{OrderAssigner, OrderPlan};
pub use repository::{AddTask, ListView, MoveOutcome, MoveRequest, Repository};
pub use store::{FileStore, MemoryStore, MemoryStoreError};
