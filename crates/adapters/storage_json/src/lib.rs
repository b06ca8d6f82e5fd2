//! # irhub-adapter-storage-json
//!
//! File-backed persistence for the command store.
//!
//! ## Responsibilities
//! - Implement the `DocumentStore` port defined in `irhub-app::ports`
//! - Keep the whole versioned document in one pretty-printed JSON file
//! - Replace that file atomically (temp file + rename) so a crash mid-write
//!   never leaves a truncated document behind
//!
//! All I/O goes through `tokio::fs`, which runs it on the blocking pool.
//!
//! ## Dependency rule
//! Depends on `irhub-app` (for the port trait) and `irhub-domain` (for the
//! error type). The `app` and `domain` crates must never reference this adapter.

pub mod error;
mod store;

pub use store::JsonFileStore;
