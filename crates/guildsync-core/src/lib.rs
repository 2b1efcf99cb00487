//! Core domain + relay engine for GuildSync.
//!
//! This crate is framework-agnostic. Discord and the translation provider live
//! behind ports (traits) implemented in adapter crates.

pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod languages;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod reaction;
pub mod relay;
pub mod retry;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{Error, Result};
