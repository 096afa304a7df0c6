//! Configuration update events.
//!
//! This module defines events that are broadcast when the live configuration
//! changes, allowing other tasks (presentation, logging) to react.

use tokio::sync::broadcast;

use super::records::ExclusionKind;

/// Events broadcast when configuration changes occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdateEvent {
    /// A new snapshot was installed.
    Reloaded { generation: u64 },
    /// A game mapping was added or updated through the store.
    GameUpserted { game: String },
    /// A game mapping was removed through the store.
    GameRemoved { game: String },
    /// An exclusion entry was added through the store.
    ExclusionAdded { kind: ExclusionKind, value: String },
    /// An exclusion entry was removed through the store.
    ExclusionRemoved { kind: ExclusionKind, value: String },
}

impl ConfigUpdateEvent {
    /// Get a description of the event for logging.
    pub fn description(&self) -> String {
        match self {
            Self::Reloaded { generation } => {
                format!("Configuration reloaded (generation {})", generation)
            }
            Self::GameUpserted { game } => format!("Game mapping updated: {}", game),
            Self::GameRemoved { game } => format!("Game mapping removed: {}", game),
            Self::ExclusionAdded { kind, value } => {
                format!("Exclusion {} added: {}", kind, value)
            }
            Self::ExclusionRemoved { kind, value } => {
                format!("Exclusion {} removed: {}", kind, value)
            }
        }
    }
}

/// Default channel capacity for config update events.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for configuration update events.
///
/// Uses tokio's broadcast channel to distribute events to multiple subscribers.
#[derive(Clone)]
pub struct ConfigEventBroadcaster {
    sender: broadcast::Sender<ConfigUpdateEvent>,
}

impl ConfigEventBroadcaster {
    /// Create a new broadcaster with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new broadcaster with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to configuration update events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigUpdateEvent> {
        self.sender.subscribe()
    }

    /// Publish a configuration update event.
    ///
    /// Returns the number of receivers that received the event.
    /// Returns 0 if there are no active subscribers.
    pub fn publish(&self, event: ConfigUpdateEvent) -> usize {
        tracing::debug!("Publishing config event: {}", event.description());
        // send() returns Err if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ConfigEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let broadcaster = ConfigEventBroadcaster::new();
        assert_eq!(broadcaster.subscriber_count(), 0);
        assert_eq!(
            broadcaster.publish(ConfigUpdateEvent::Reloaded { generation: 1 }),
            0
        );
    }

    #[test]
    fn test_publish_subscribe() {
        let broadcaster = ConfigEventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        let event = ConfigUpdateEvent::GameUpserted {
            game: "Chess".to_string(),
        };
        assert_eq!(broadcaster.publish(event.clone()), 1);
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_description() {
        let event = ConfigUpdateEvent::GameRemoved {
            game: "Chess".to_string(),
        };
        assert!(event.description().contains("Chess"));
        assert!(
            ConfigUpdateEvent::Reloaded { generation: 3 }
                .description()
                .contains('3')
        );
    }
}
