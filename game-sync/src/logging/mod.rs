//! Logging setup with a reloadable filter and daily log files.
//!
//! This module provides:
//! - Runtime log level changes via `tracing_subscriber::reload`
//! - Log file retention cleanup (deletes logs older than 7 days)
//! - Local timezone timestamps for logs

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
};

use crate::utils::fs;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "game_sync=info,platforms_api=info,process_utils=info";

/// Filter used with `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "game_sync=debug,platforms_api=debug,process_utils=debug";

/// Filter used with `--quiet`.
pub const QUIET_LOG_FILTER: &str = "game_sync=warn,platforms_api=warn,process_utils=warn";

/// Log file name prefix; the appender adds `.YYYY-MM-DD`.
pub const LOG_FILE_NAME: &str = "game-sync.log";

/// Log retention period in days.
const LOG_RETENTION_DAYS: i64 = 7;

/// Timestamps in the local timezone.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Type alias for the reload handle.
pub type FilterHandle = Handle<EnvFilter, tracing_subscriber::Registry>;

/// Pick the filter directive from the command-line verbosity flags.
pub fn filter_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => VERBOSE_LOG_FILTER,
        (false, true) => QUIET_LOG_FILTER,
        (false, false) => DEFAULT_LOG_FILTER,
    }
}

/// Handle to the installed subscriber.
pub struct LoggingConfig {
    handle: FilterHandle,
    log_dir: Option<PathBuf>,
    /// Filter installed at startup, restored when the persisted one goes away.
    initial_filter: String,
    persisted: Mutex<Option<String>>,
}

impl LoggingConfig {
    fn new(handle: FilterHandle, log_dir: Option<PathBuf>) -> Self {
        let initial_filter = handle
            .with_current(|filter| filter.to_string())
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        Self {
            handle,
            log_dir,
            initial_filter,
            persisted: Mutex::new(None),
        }
    }

    /// Get the current filter directive string.
    pub fn get_filter(&self) -> String {
        self.handle
            .with_current(|filter| filter.to_string())
            .unwrap_or_default()
    }

    /// Set a new filter directive, e.g. `game_sync=debug`.
    pub fn set_filter(&self, directive: &str) -> crate::Result<()> {
        let new_filter = EnvFilter::try_new(directive)
            .map_err(|e| crate::Error::Other(format!("Invalid filter directive: {}", e)))?;

        self.handle
            .reload(new_filter)
            .map_err(|e| crate::Error::Other(format!("Failed to reload filter: {}", e)))?;

        info!(directive = %directive, "Log filter updated");
        Ok(())
    }

    /// Apply the filter stored in the configuration, if it changed.
    ///
    /// `None` restores the startup filter. Invalid directives are logged and
    /// leave the current filter in place.
    pub fn apply_persisted_filter(&self, directive: Option<&str>) {
        let directive = directive.map(str::trim).filter(|d| !d.is_empty());
        let mut persisted = self.persisted.lock();
        if persisted.as_deref() == directive {
            return;
        }

        match self.set_filter(directive.unwrap_or(&self.initial_filter)) {
            Ok(()) => {
                *persisted = directive.map(str::to_string);
                info!(filter = %self.get_filter(), "Applied persisted log filter");
            }
            Err(e) => warn!("Failed to apply persisted log filter: {}", e),
        }
    }

    /// Directory of the log files, when file logging is enabled.
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// Delete expired log files now and then once a day.
    pub fn start_retention_cleanup(self: &Arc<Self>, cancel_token: CancellationToken) {
        let Some(log_dir) = self.log_dir.clone() else {
            return;
        };

        tokio::spawn(async move {
            let cleanup_interval = Duration::from_secs(24 * 60 * 60);

            loop {
                let today = Local::now().date_naive();
                if let Err(e) = cleanup_old_logs(&log_dir, today, LOG_RETENTION_DAYS).await {
                    warn!(error = %e, "Failed to cleanup old logs");
                }

                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        debug!("Log retention cleanup task shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(cleanup_interval) => {}
                }
            }
        });
    }
}

/// Delete `game-sync.log.YYYY-MM-DD` files older than `retention_days`.
async fn cleanup_old_logs(
    log_dir: &Path,
    today: NaiveDate,
    retention_days: i64,
) -> std::io::Result<usize> {
    let cutoff = today - chrono::Duration::days(retention_days);
    let prefix = format!("{LOG_FILE_NAME}.");

    let mut entries = tokio::fs::read_dir(log_dir).await?;
    let mut deleted_count = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(date_str) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(&prefix))
        else {
            continue;
        };

        let Ok(file_date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
            continue;
        };

        if file_date < cutoff {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to delete old log file");
            } else {
                deleted_count += 1;
                debug!(path = %path.display(), "Deleted old log file");
            }
        }
    }

    if deleted_count > 0 {
        info!(count = deleted_count, "Cleaned up old log files");
    }

    Ok(deleted_count)
}

fn initial_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

/// Console plus daily file logging, for the long-running monitor.
///
/// `RUST_LOG` takes precedence over `directive`. Keep the returned guard alive
/// for the lifetime of the process or buffered file output is lost.
pub fn init_logging(
    log_dir: &Path,
    directive: &str,
) -> crate::Result<(Arc<LoggingConfig>, WorkerGuard)> {
    fs::ensure_dir_all_sync_with_op("creating log directory", log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let (filter_layer, filter_handle) = reload::Layer::new(initial_filter(directive));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_ansi(true).with_timer(LocalTimer))
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer),
        )
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {}", e))
        })?;

    Ok((
        Arc::new(LoggingConfig::new(
            filter_handle,
            Some(log_dir.to_path_buf()),
        )),
        guard,
    ))
}

/// Stderr-only logging for one-shot commands, keeping stdout for output.
pub fn init_console_logging(directive: &str) -> crate::Result<Arc<LoggingConfig>> {
    let (filter_layer, filter_handle) = reload::Layer::new(initial_filter(directive));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimer),
        )
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {}", e))
        })?;

    Ok(Arc::new(LoggingConfig::new(filter_handle, None)))
}
