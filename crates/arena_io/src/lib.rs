//! # Arena IO
//!
//! Local persisted state for the zombie arena.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - JSON serialization helpers with atomic file writes
//! - Key/value stores (in-memory and single JSON file)
//! - Typed accessors for the engine's persisted keys

/// Error types and result aliases for I/O operations
pub mod error;
/// Validated JSON helpers
pub mod serialization;
/// Typed access to battle history, cooldowns, display names and snapshots
pub mod state;
/// Key/value store backends
pub mod storage;

pub use error::{IoError, Result};
pub use serialization::{from_json, read_json_file, to_json, to_json_pretty, write_json_file};
pub use state::{CachedSnapshot, LocalState};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
