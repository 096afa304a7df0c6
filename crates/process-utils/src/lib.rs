//! Small process-related helpers shared across the workspace.
//!
//! The only thing the rest of the workspace needs from the operating system is
//! "which process names are running right now", captured as an ordered
//! [`ProcessSnapshot`].

use parking_lot::Mutex;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::trace;

/// Ordered process names observed during one enumeration.
///
/// Order is the enumeration order of the source and is significant for game
/// matching: earlier names win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSnapshot {
    names: Vec<String>,
}

impl ProcessSnapshot {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ProcessSnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Anything that can list running processes.
///
/// Implementations must never fail as a whole: a process that vanishes or
/// cannot be inspected mid-enumeration is simply left out.
pub trait ProcessSource: Send + Sync {
    fn snapshot(&self) -> ProcessSnapshot;
}

/// [`ProcessSource`] backed by the `sysinfo` process table.
pub struct SystemProcessSource {
    system: Mutex<System>,
}

impl SystemProcessSource {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SystemProcessSource {
    fn snapshot(&self) -> ProcessSnapshot {
        let mut system = self.system.lock();

        // Names only; dead processes are dropped from the table.
        let refreshed = system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );
        trace!(refreshed, "Refreshed process table");

        let mut processes: Vec<_> = system
            .processes()
            .iter()
            .filter_map(|(pid, process)| {
                let name = process.name().to_string_lossy();
                if name.is_empty() {
                    return None;
                }
                Some((pid.as_u32(), name.into_owned()))
            })
            .collect();

        // The table is a hash map; PID order keeps one run stable.
        processes.sort_unstable_by_key(|(pid, _)| *pid);

        processes.into_iter().map(|(_, name)| name).collect()
    }
}

/// Fixed list of names, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct StaticProcessSource {
    names: Vec<String>,
}

impl StaticProcessSource {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ProcessSource for StaticProcessSource {
    fn snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot::new(self.names.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_preserves_order() {
        let snapshot: ProcessSnapshot = ["b.exe", "a.exe", "c.exe"].into_iter().collect();
        assert_eq!(snapshot.names(), &["b.exe", "a.exe", "c.exe"]);
        assert_eq!(snapshot.len(), 3);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_static_source() {
        let source = StaticProcessSource::new(["game.exe", "explorer.exe"]);
        let snapshot = source.snapshot();
        assert_eq!(snapshot.iter().collect::<Vec<_>>(), vec!["game.exe", "explorer.exe"]);
    }

    #[test]
    fn test_system_source_lists_processes() {
        let source = SystemProcessSource::new();
        let snapshot = source.snapshot();
        // The test runner itself is running.
        assert!(!snapshot.is_empty());
        assert!(snapshot.iter().all(|name| !name.is_empty()));
    }
}
