//! game-sync library crate.
//!
//! Watches the local process table, infers which configured game is running
//! and keeps the Twitch channel title and category in sync with it.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod publisher;
pub mod utils;

pub use error::{Error, Result};
