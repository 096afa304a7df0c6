//! Streaming platform API bindings.
//!
//! Only the pieces needed to keep a channel's metadata in sync are covered:
//! category search and channel patching on Twitch Helix.

pub mod client;
pub mod error;
pub mod twitch;

pub use client::{ApiClient, create_client_builder, default_client, install_rustls_provider};
pub use error::ApiError;
