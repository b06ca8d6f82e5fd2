//! # irhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for devices, commands, remotes, lights and covers
//!   (`/api/devices`, `/api/services/learn_command`, …)
//! - Map HTTP requests into [`RemoteService`](irhub_app::services::remote_service::RemoteService)
//!   calls (driving adapter)
//! - Map results and errors into HTTP responses
//!
//! Every request locks the one shared service, so operations never
//! interleave and no two transmissions overlap.
//!
//! ## Dependency rule
//! Depends on `irhub-app` (for port traits and services) and `irhub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
