//! # irhub-adapter-virtual
//!
//! A blaster that exists only in memory.
//!
//! [`VirtualBlaster`] implements both the `Blaster` port (it records recent
//! transmissions) and the `CodeExtractor` port (with `auto_code` on, each
//! capture leaves a generated code behind that extraction then takes). It
//! lets the daemon run end to end without hardware.
//!
//! ## Dependency rule
//!
//! Depends on `irhub-app` (port traits) and `irhub-domain` only.

mod blaster;
pub mod error;

pub use blaster::{TRANSMISSION_LOG_LIMIT, Transmission, VirtualBlaster};
