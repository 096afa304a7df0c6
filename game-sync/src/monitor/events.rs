//! Events emitted by the game monitor.

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::broadcast;

/// Events emitted by the [`GameMonitor`](super::GameMonitor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MonitorEvent {
    /// The detected game differs from the previous tick.
    GameChanged {
        previous: Option<String>,
        current: String,
        /// Process that matched, absent for the fallback category.
        process: Option<String>,
        timestamp: DateTime<Local>,
    },
    TitleUpdated {
        title: String,
        timestamp: DateTime<Local>,
    },
    CategoryUpdated {
        requested: String,
        applied: String,
        timestamp: DateTime<Local>,
    },
    /// A title or category update did not take effect.
    PublishFailed {
        target: PublishTarget,
        reason: String,
        timestamp: DateTime<Local>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublishTarget {
    Title,
    Category,
}

impl MonitorEvent {
    pub fn description(&self) -> String {
        match self {
            MonitorEvent::GameChanged {
                previous, current, ..
            } => match previous {
                Some(previous) => format!("game changed: {} -> {}", previous, current),
                None => format!("game detected: {}", current),
            },
            MonitorEvent::TitleUpdated { title, .. } => format!("title set to '{}'", title),
            MonitorEvent::CategoryUpdated {
                requested, applied, ..
            } => {
                if requested == applied {
                    format!("category set to '{}'", applied)
                } else {
                    format!("category '{}' not found, set to '{}'", requested, applied)
                }
            }
            MonitorEvent::PublishFailed { target, reason, .. } => {
                format!("{:?} update failed: {}", target, reason)
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, MonitorEvent::PublishFailed { .. })
    }
}

#[derive(Clone)]
pub struct MonitorEventBroadcaster {
    sender: broadcast::Sender<MonitorEvent>,
}

impl MonitorEventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of receivers; zero when nobody listens.
    pub fn publish(&self, event: MonitorEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MonitorEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
