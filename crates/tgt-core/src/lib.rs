//! Core domain layer for the Telegram transfer tools.
//!
//! This crate is intentionally protocol-agnostic. The actual messaging client
//! and the config storage live behind ports (traits) so the harvesting engine
//! in `tgt-engine` can be driven by a real adapter or an in-memory fake.

pub mod classify;
pub mod domain;
pub mod errors;
pub mod files;
pub mod links;
pub mod logging;
pub mod provider;
pub mod store;
pub mod thumbnail;

pub use errors::{Error, Result};
