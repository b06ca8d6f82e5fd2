//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod command_store;
pub mod dispatcher;
pub mod extraction_registry;
pub mod learning;
pub mod remote_service;
pub mod resolver;
