//! # irhub-domain
//!
//! Pure domain model for irhub, a manager of "virtual" appliances driven by
//! replaying learned infrared/RF codes through a physical blaster.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Commands** (learned IR/RF codes, base64 payloads)
//! - Define **Virtual devices** (a named appliance bound to one blaster)
//! - Define **Entity configs** (per entity-type command mappings, options and
//!   assumed state)
//! - Derive **capabilities** from a configuration (brightness, colour
//!   temperature, effects, open/close/stop)
//! - Translate semantic actions into ordered **command plans**
//! - Describe the versioned **persisted document** and its migrations
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod capability;
pub mod command;
pub mod cover;
pub mod device;
pub mod document;
pub mod entity_config;
pub mod light;
pub mod mapping;
pub mod translate;
