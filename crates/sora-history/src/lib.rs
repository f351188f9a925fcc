//! Local generation history.
//!
//! This crate provides:
//! - The `HistoryStore` capability (load, append with eviction, resolve)
//! - A JSON file store at a user-scoped path
//! - An in-memory store for tests and dry runs
//! - Remix reference resolution (`@last`, `@N`, output filename, raw id)

pub mod error;
pub mod json_file;
pub mod memory;
pub mod resolve;
pub mod store;

pub use error::{HistoryError, HistoryResult};
pub use json_file::{default_history_path, JsonFileStore};
pub use memory::MemoryHistoryStore;
pub use resolve::{resolve_reference, LAST_REFERENCE};
pub use store::HistoryStore;
