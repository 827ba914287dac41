//! Core of the Spotify downloader bot.
//!
//! This crate is intentionally framework-agnostic. Spotify and Telegram live
//! behind ports (traits) implemented in adapter crates.

pub mod commands;
pub mod config;
pub mod domain;
pub mod encode;
pub mod errors;
pub mod fetch;
pub mod logging;
pub mod policy;
pub mod ports;
pub mod router;
pub mod session;

pub use errors::{Error, Result};
