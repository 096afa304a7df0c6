//! Hot reload of the configuration files.
//!
//! A `notify` watcher observes the configuration directory and forwards raw
//! events into a tokio task. The task coalesces bursts (editors often write a
//! file several times in a row) and then asks the [`ConfigStore`] to reload.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::records::{EXCLUSIONS_FILE, MAPPING_FILE};
use super::store::ConfigStore;
use crate::{Error, Result};

/// Quiet period after the last relevant event before reloading.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Keeps the OS watcher alive and owns the reload task.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl ConfigWatcher {
    /// Start watching the store's configuration directory.
    pub fn spawn(store: Arc<ConfigStore>, cancel: CancellationToken) -> Result<Self> {
        let dir = store
            .paths()
            .map(|p| p.dir.clone())
            .ok_or_else(|| Error::config("in-memory configuration cannot be watched"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => warn!(error = %e, "Config watcher error"),
            },
            Config::default(),
        )?;

        // Watch the directory rather than the files: editors and our own
        // writer replace files by rename.
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(dir = %dir.display(), "Watching configuration for changes");

        let task = tokio::spawn(reload_loop(store, rx, cancel));
        Ok(Self {
            _watcher: watcher,
            task,
        })
    }

    /// Wait for the reload task to finish after cancellation.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "Config watcher task failed");
        }
    }
}

async fn reload_loop(
    store: Arc<ConfigStore>,
    mut rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        if !is_config_event(&event) {
            continue;
        }
        debug!(paths = ?event.paths, kind = ?event.kind, "Configuration file changed");

        // Swallow the rest of the burst.
        let deadline = tokio::time::sleep(DEBOUNCE);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                more = rx.recv() => if more.is_none() { break },
            }
        }

        let snapshot = store.reload();
        info!(
            generation = snapshot.generation,
            games = snapshot.games().len(),
            "Configuration hot-reloaded"
        );
    }
    debug!("Config watcher shutting down");
}

/// Whether `event` touches one of the reloadable records.
pub(crate) fn is_config_event(event: &Event) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant_kind
        && event.paths.iter().any(|path| {
            path.file_name()
                .is_some_and(|name| name == OsStr::new(MAPPING_FILE) || name == OsStr::new(EXCLUSIONS_FILE))
        })
}
