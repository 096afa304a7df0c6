//! Configuration module.
//!
//! This module provides the on-disk records, the live [`ConfigStore`] with
//! atomic snapshot replacement, the hot-reload watcher and first-run
//! bootstrap.

pub mod app;
pub mod bootstrap;
pub mod events;
pub mod records;
pub mod store;
pub mod watcher;

pub use app::AppConfig;
pub use bootstrap::{BootstrapReport, DEFAULT_MAPPING_URL, bootstrap};
pub use events::{ConfigEventBroadcaster, ConfigUpdateEvent};
pub use records::{ConfigPaths, Credentials, ExclusionKind, ExclusionRecord, MappingRecord};
pub use store::{ConfigSnapshot, ConfigStore};
pub use watcher::ConfigWatcher;
