//! Game monitor: detects the running game and keeps the channel in sync.

pub mod events;
mod service;
mod state;

pub use events::{MonitorEvent, MonitorEventBroadcaster, PublishTarget};
pub use service::{GameMonitor, MonitorConfig, TickReport};
pub use state::{ReconciliationState, Transition};
