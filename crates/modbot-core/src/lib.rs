//! Core of the modular chat bot.
//!
//! This crate is intentionally framework-agnostic. The chat network, the sqlite
//! stores and the knowledge engine live behind ports (traits) implemented in
//! adapter crates.

pub mod bot;
pub mod commands;
pub mod config;
pub mod dice;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod module;
pub mod modules;
pub mod ports;
pub mod settings;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
