//! # irhub-adapter-broadlink
//!
//! Code-extraction strategy for Broadlink blasters.
//!
//! The Broadlink integration keeps every code it learns in
//! `<storage_dir>/broadlink_remote_<mac>_codes`:
//!
//! ```json
//! {"data": {"<device>": {"<command>": "<base64>"}}}
//! ```
//!
//! After a capture, [`BroadlinkExtractor`] reads the code back from that file
//! so the user never has to copy it by hand.
//!
//! ## Dependency rule
//! Depends on `irhub-app` (for the `CodeExtractor` port) and `irhub-domain`.

pub mod error;
mod extractor;
mod mac;

pub use extractor::BroadlinkExtractor;
pub use mac::normalize_mac;
