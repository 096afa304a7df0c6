//! The reconciliation loop.
//!
//! Every tick the monitor enumerates processes, infers the running game and,
//! only when the game changed since the previous tick, pushes a new title and
//! category to the platform.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use process_utils::{ProcessSnapshot, ProcessSource};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::{MonitorEvent, MonitorEventBroadcaster, PublishTarget};
use super::state::{ReconciliationState, Transition};
use crate::config::{AppConfig, ConfigSnapshot, ConfigStore};
use crate::domain::{DiagnosticReport, JUST_CHATTING, diagnose, detect_match, format_title};
use crate::publisher::{ChannelPublisher, PublishOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub tick_interval: Duration,
    /// Diagnostic rescan every this many ticks; zero disables it.
    pub diagnostic_every: u64,
    /// Run one diagnostic before the first tick.
    pub startup_diagnostic: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for MonitorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            tick_interval: config.tick_interval,
            diagnostic_every: config.diagnostic_every,
            startup_diagnostic: true,
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub game: String,
    pub changed: bool,
    pub diagnostic: Option<DiagnosticReport>,
}

pub struct GameMonitor {
    config: MonitorConfig,
    store: Arc<ConfigStore>,
    source: Arc<dyn ProcessSource>,
    publisher: ChannelPublisher,
    state: ReconciliationState,
    ticks: u64,
    current_game: watch::Sender<Option<String>>,
    events: MonitorEventBroadcaster,
}

impl GameMonitor {
    pub fn new(
        config: MonitorConfig,
        store: Arc<ConfigStore>,
        source: Arc<dyn ProcessSource>,
        publisher: ChannelPublisher,
    ) -> Self {
        let (current_game, _) = watch::channel(None);
        Self {
            config,
            store,
            source,
            publisher,
            state: ReconciliationState::new(),
            ticks: 0,
            current_game,
            events: MonitorEventBroadcaster::new(),
        }
    }

    /// Latest detected game, updated after every tick.
    pub fn current_game(&self) -> watch::Receiver<Option<String>> {
        self.current_game.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    /// Run until `cancel` fires. A tick in progress is finished first.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            interval_secs = self.config.tick_interval.as_secs(),
            diagnostic_every = self.config.diagnostic_every,
            "Game monitor started"
        );

        if self.config.startup_diagnostic {
            let config = self.store.snapshot();
            let snapshot = self.scan().await;
            log_diagnostic(&diagnose(&snapshot, config.games(), &config.exclusions));
        }

        while !cancel.is_cancelled() {
            self.tick().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.tick_interval) => {}
            }
        }

        info!("Game monitor stopped");
    }

    /// One tick dated today in local time.
    pub async fn tick(&mut self) -> TickReport {
        self.tick_on(Local::now().date_naive()).await
    }

    /// One tick with an explicit date for the title.
    pub async fn tick_on(&mut self, today: NaiveDate) -> TickReport {
        self.ticks += 1;
        // One configuration snapshot for the whole tick.
        let config = self.store.snapshot();
        let snapshot = self.scan().await;

        let matched = detect_match(&snapshot, config.games(), &config.exclusions);
        let (game, process) = match matched {
            Some(m) => (m.game, Some(m.process)),
            None => (JUST_CHATTING.to_string(), None),
        };
        self.current_game.send_replace(Some(game.clone()));

        let changed = match self.state.transition(&game) {
            Transition::Unchanged => {
                debug!(game = %game, "Game unchanged");
                false
            }
            Transition::Changed { previous } => {
                info!(
                    previous = previous.as_deref().unwrap_or("-"),
                    current = %game,
                    process = process.as_deref().unwrap_or("-"),
                    "Detected game changed"
                );
                self.events.publish(MonitorEvent::GameChanged {
                    previous,
                    current: game.clone(),
                    process,
                    timestamp: Local::now(),
                });
                self.publish(&config, &game, today).await;
                true
            }
        };

        // The diagnostic takes its own full rescan.
        let diagnostic = if self.diagnostic_due() {
            let rescan = self.scan().await;
            let report = diagnose(&rescan, config.games(), &config.exclusions);
            log_diagnostic(&report);
            Some(report)
        } else {
            None
        };

        TickReport {
            game,
            changed,
            diagnostic,
        }
    }

    fn diagnostic_due(&self) -> bool {
        self.config.diagnostic_every > 0 && self.ticks % self.config.diagnostic_every == 0
    }

    /// Title first, then category.
    async fn publish(&self, config: &ConfigSnapshot, game: &str, today: NaiveDate) {
        let title = format_title(config.title_template(), game, today);
        match self.publisher.update_title(&title).await {
            PublishOutcome::Updated(title) => {
                self.events.publish(MonitorEvent::TitleUpdated {
                    title,
                    timestamp: Local::now(),
                });
            }
            other => self.publish_failed(PublishTarget::Title, &other),
        }

        let category = config.category_for(game);
        match self.publisher.update_category(category).await {
            PublishOutcome::Updated(applied) => {
                self.events.publish(MonitorEvent::CategoryUpdated {
                    requested: category.to_string(),
                    applied,
                    timestamp: Local::now(),
                });
            }
            PublishOutcome::FellBack { requested, applied } => {
                self.events.publish(MonitorEvent::CategoryUpdated {
                    requested,
                    applied,
                    timestamp: Local::now(),
                });
            }
            other => self.publish_failed(PublishTarget::Category, &other),
        }
    }

    fn publish_failed(&self, target: PublishTarget, outcome: &PublishOutcome) {
        let reason = match outcome {
            PublishOutcome::NotFound(name) => format!("category '{}' not found", name),
            PublishOutcome::Failed(reason) => reason.clone(),
            PublishOutcome::Updated(_) | PublishOutcome::FellBack { .. } => return,
        };
        self.events.publish(MonitorEvent::PublishFailed {
            target,
            reason,
            timestamp: Local::now(),
        });
    }

    /// Enumerate processes off the async runtime.
    async fn scan(&self) -> ProcessSnapshot {
        let source = Arc::clone(&self.source);
        match tokio::task::spawn_blocking(move || source.snapshot()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Process enumeration task failed");
                ProcessSnapshot::default()
            }
        }
    }
}

fn log_diagnostic(report: &DiagnosticReport) {
    info!(
        processes = report.entries.len(),
        excluded = report.excluded,
        watched = report.watched.len(),
        "Process diagnostic"
    );
    let mut any = false;
    for entry in report.potential_matches() {
        any = true;
        info!(
            process = %entry.process,
            games = ?entry.potential_games,
            "Potential game match"
        );
    }
    if !any {
        info!("No potential game matches among running processes");
    }
    debug!("{report}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExclusionRecord, MappingRecord};
    use crate::publisher::MockChannelApi;
    use mockall::predicate::eq;
    use platforms_api::twitch::Category;
    use process_utils::StaticProcessSource;

    fn store() -> Arc<ConfigStore> {
        let mut mapping = MappingRecord::default();
        mapping.title_template = "%game% | %date%".to_string();
        mapping.games.insert("Chess", "chess.exe");
        mapping.categories.insert("Chess", "Chess");
        Arc::new(ConfigStore::in_memory(mapping, ExclusionRecord::default()))
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn config() -> MonitorConfig {
        MonitorConfig {
            tick_interval: Duration::from_millis(10),
            diagnostic_every: 0,
            startup_diagnostic: false,
        }
    }

    #[tokio::test]
    async fn test_repeated_ticks_publish_once() {
        let mut api = MockChannelApi::new();
        api.expect_set_title()
            .with(eq("Chess | 2024-01-05"))
            .times(1)
            .returning(|_| Ok(()));
        api.expect_search_category()
            .with(eq("Chess"))
            .times(1)
            .returning(|_| {
                Ok(Some(Category {
                    id: "743".to_string(),
                    name: "Chess".to_string(),
                    box_art_url: None,
                }))
            });
        api.expect_set_category()
            .with(eq("743"))
            .times(1)
            .returning(|_| Ok(()));

        let source = Arc::new(StaticProcessSource::new(["explorer.exe", "chess.exe"]));
        let mut monitor = GameMonitor::new(
            config(),
            store(),
            source,
            ChannelPublisher::new(Arc::new(api)),
        );
        let current = monitor.current_game();

        let first = monitor.tick_on(day()).await;
        assert!(first.changed);
        assert_eq!(first.game, "Chess");
        for _ in 0..3 {
            assert!(!monitor.tick_on(day()).await.changed);
        }
        assert_eq!(current.borrow().as_deref(), Some("Chess"));
    }

    #[tokio::test]
    async fn test_events_and_diagnostic_schedule() {
        let mut api = MockChannelApi::new();
        api.expect_set_title().returning(|_| Ok(()));
        api.expect_search_category().returning(|_| Ok(None));
        api.expect_set_category().never();

        let mut monitor = GameMonitor::new(
            MonitorConfig {
                diagnostic_every: 2,
                ..config()
            },
            store(),
            Arc::new(StaticProcessSource::new(["notepad.exe"])),
            ChannelPublisher::new(Arc::new(api)),
        );
        let mut events = monitor.subscribe();

        let first = monitor.tick_on(day()).await;
        assert_eq!(first.game, JUST_CHATTING);
        assert!(first.diagnostic.is_none());
        assert!(monitor.tick_on(day()).await.diagnostic.is_some());

        assert!(matches!(
            events.recv().await.unwrap(),
            MonitorEvent::GameChanged { previous: None, .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            MonitorEvent::TitleUpdated { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            MonitorEvent::PublishFailed {
                target: PublishTarget::Category,
                ..
            }
        ));
    }

    /// Counts enumerations.
    #[derive(Default)]
    struct CountingSource {
        scans: std::sync::atomic::AtomicUsize,
    }

    impl ProcessSource for CountingSource {
        fn snapshot(&self) -> ProcessSnapshot {
            self.scans
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            ["chess.exe"].into_iter().collect()
        }
    }

    #[tokio::test]
    async fn test_diagnostic_takes_a_fresh_scan() {
        let mut api = MockChannelApi::new();
        api.expect_set_title().returning(|_| Ok(()));
        api.expect_search_category().returning(|_| Ok(None));
        api.expect_set_category().never();

        let source = Arc::new(CountingSource::default());
        let mut monitor = GameMonitor::new(
            MonitorConfig {
                diagnostic_every: 2,
                ..config()
            },
            store(),
            source.clone(),
            ChannelPublisher::new(Arc::new(api)),
        );

        monitor.tick_on(day()).await;
        assert_eq!(source.scans.load(std::sync::atomic::Ordering::SeqCst), 1);

        let report = monitor.tick_on(day()).await;
        assert_eq!(source.scans.load(std::sync::atomic::Ordering::SeqCst), 3);
        let diagnostic = report.diagnostic.unwrap();
        assert_eq!(diagnostic.entries.len(), 1);
        assert_eq!(diagnostic.entries[0].potential_games, vec!["Chess"]);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let mut api = MockChannelApi::new();
        api.expect_set_title().returning(|_| Ok(()));
        api.expect_search_category().returning(|_| Ok(None));

        let monitor = GameMonitor::new(
            config(),
            store(),
            Arc::new(StaticProcessSource::new(Vec::<String>::new())),
            ChannelPublisher::new(Arc::new(api)),
        );
        let mut current = monitor.current_game();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(monitor.run(cancel.clone()));

        current.changed().await.unwrap();
        assert_eq!(current.borrow().as_deref(), Some(JUST_CHATTING));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
