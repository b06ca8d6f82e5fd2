//! # irhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DocumentStore` — load & save the versioned JSON document
//!   - `Blaster` — transmit an encoded command, capture a new one
//!   - `CodeExtractor` — read a freshly captured code back from the
//!     blaster's own storage
//! - Define **driving/inbound ports** as use-case structs:
//!   - `CommandStore` — devices and commands, persisted after every mutation
//!   - `CommandResolver` — read-only lookups over the store
//!   - `Dispatcher` — ordered, non-overlapping transmission
//!   - `LearningOrchestrator` — capture then extract, or ask for manual entry
//!   - `RemoteService` — the facade every driving adapter talks to
//!
//! ## Dependency rule
//! Depends on `irhub-domain` only (plus `tokio::time` for delays and
//! timeouts). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod fakes;
