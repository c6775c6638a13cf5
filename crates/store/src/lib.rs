//! Task storage for reminder dispatch.
//!
//! This crate provides:
//! - `TaskStore` trait: bulk read of pending tasks and idempotent delete
//! - `MemoryTaskStore` for tests and embedding
//! - `JsonFileTaskStore`, a single-file store keyed by task id

pub mod error;
pub mod json_file;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use json_file::JsonFileTaskStore;
pub use memory::MemoryTaskStore;
pub use traits::TaskStore;
