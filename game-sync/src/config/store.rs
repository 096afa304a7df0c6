//! Live configuration store.
//!
//! The tables consumed by the monitor are published as one immutable
//! [`ConfigSnapshot`]. A reload builds a complete new snapshot and swaps the
//! pointer, so a reader holding an `Arc` never sees a half-updated mapping.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::info;

use super::events::{ConfigEventBroadcaster, ConfigUpdateEvent};
use super::records::{ConfigPaths, ExclusionKind, ExclusionRecord, MappingRecord};
use crate::domain::{CategoryMapping, ExclusionFilter, GameMapping, JUST_CHATTING};
use crate::{Error, Result};

/// One consistent view of every table.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// Increases by one on every replacement.
    pub generation: u64,
    pub mapping: MappingRecord,
    /// Exclusions as configured, for display and editing.
    pub exclusion_record: ExclusionRecord,
    /// Exclusions compiled for matching.
    pub exclusions: ExclusionFilter,
}

impl ConfigSnapshot {
    pub fn title_template(&self) -> &str {
        &self.mapping.title_template
    }

    pub fn games(&self) -> &GameMapping {
        &self.mapping.games
    }

    pub fn categories(&self) -> &CategoryMapping {
        &self.mapping.categories
    }

    /// Category to publish for `game`, falling back to [`JUST_CHATTING`].
    pub fn category_for(&self, game: &str) -> &str {
        self.mapping.categories.get(game).unwrap_or(JUST_CHATTING)
    }
}

/// Holds the current snapshot and applies reloads and mutations.
pub struct ConfigStore {
    /// `None` for a purely in-memory store.
    paths: Option<ConfigPaths>,
    current: RwLock<Arc<ConfigSnapshot>>,
    /// Serializes read-modify-write cycles on the records.
    write_lock: Mutex<()>,
    events: ConfigEventBroadcaster,
}

impl ConfigStore {
    /// Open a store backed by the files in `paths`.
    ///
    /// Never fails: unreadable records are logged and replaced by empty ones.
    pub fn open(paths: ConfigPaths) -> Self {
        let mapping = MappingRecord::load(&paths.mapping);
        let exclusions = ExclusionRecord::load(&paths.exclusions);
        let store = Self::build(Some(paths), mapping, &exclusions);
        info!(
            games = store.snapshot().games().len(),
            "Configuration loaded"
        );
        store
    }

    /// A store that lives only in memory.
    pub fn in_memory(mapping: MappingRecord, exclusions: ExclusionRecord) -> Self {
        Self::build(None, mapping, &exclusions)
    }

    fn build(paths: Option<ConfigPaths>, mapping: MappingRecord, exclusions: &ExclusionRecord) -> Self {
        Self {
            paths,
            current: RwLock::new(Arc::new(ConfigSnapshot {
                generation: 1,
                mapping,
                exclusions: exclusions.to_filter(),
                exclusion_record: exclusions.clone(),
            })),
            write_lock: Mutex::new(()),
            events: ConfigEventBroadcaster::new(),
        }
    }

    pub fn paths(&self) -> Option<&ConfigPaths> {
        self.paths.as_ref()
    }

    /// The current snapshot. Cheap; hold it for as long as one unit of work.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigUpdateEvent> {
        self.events.subscribe()
    }

    /// Install new tables as one unit.
    pub fn replace(&self, mapping: MappingRecord, exclusions: &ExclusionRecord) -> Arc<ConfigSnapshot> {
        self.install(mapping, exclusions.clone())
    }

    fn install(&self, mapping: MappingRecord, exclusions: ExclusionRecord) -> Arc<ConfigSnapshot> {
        let filter = exclusions.to_filter();
        let snapshot = {
            let mut current = self.current.write();
            let snapshot = Arc::new(ConfigSnapshot {
                generation: current.generation + 1,
                mapping,
                exclusion_record: exclusions,
                exclusions: filter,
            });
            *current = snapshot.clone();
            snapshot
        };

        info!(
            generation = snapshot.generation,
            games = snapshot.games().len(),
            "Configuration reloaded"
        );
        self.events.publish(ConfigUpdateEvent::Reloaded {
            generation: snapshot.generation,
        });
        snapshot
    }

    /// Re-read every record from disk and install the result.
    ///
    /// An in-memory store keeps its current snapshot.
    pub fn reload(&self) -> Arc<ConfigSnapshot> {
        match &self.paths {
            Some(paths) => {
                let mapping = MappingRecord::load(&paths.mapping);
                let exclusions = ExclusionRecord::load(&paths.exclusions);
                self.replace(mapping, &exclusions)
            }
            None => self.snapshot(),
        }
    }

    /// Add or update a game mapping, optionally with its category.
    ///
    /// An empty or absent `category` leaves any existing category untouched.
    pub fn upsert_game(
        &self,
        game: &str,
        process: &str,
        category: Option<&str>,
    ) -> Result<Arc<ConfigSnapshot>> {
        let game = game.trim();
        let process = process.trim();
        if game.is_empty() || process.is_empty() {
            return Err(Error::validation("game name and process name are required"));
        }
        let category = category.map(str::trim).filter(|c| !c.is_empty());

        let snapshot = self.mutate_mapping(|record| {
            record.games.insert(game, process);
            if let Some(category) = category {
                record.categories.insert(game, category);
            }
            true
        })?;

        info!(game, process, category = ?category, "Game mapping saved");
        self.events.publish(ConfigUpdateEvent::GameUpserted {
            game: game.to_string(),
        });
        Ok(snapshot)
    }

    /// Remove a game from both tables. Returns whether it existed.
    pub fn remove_game(&self, game: &str) -> Result<bool> {
        let mut removed = false;
        self.mutate_mapping(|record| {
            let had_process = record.games.remove(game).is_some();
            let had_category = record.categories.remove(game).is_some();
            removed = had_process || had_category;
            removed
        })?;

        if removed {
            info!(game, "Game mapping removed");
            self.events.publish(ConfigUpdateEvent::GameRemoved {
                game: game.to_string(),
            });
        }
        Ok(removed)
    }

    /// Add a process name or prefix to the exclusions.
    ///
    /// Empty values and entries already listed (ignoring case) are rejected.
    pub fn add_exclusion(&self, kind: ExclusionKind, value: &str) -> Result<Arc<ConfigSnapshot>> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::validation(format!("excluded {kind} must not be empty")));
        }

        let mut added = false;
        let snapshot = self.mutate_exclusions(|record| {
            added = record.add(kind, value);
            added
        })?;
        if !added {
            return Err(Error::validation(format!(
                "{value} is already an excluded {kind}"
            )));
        }

        info!(%kind, value, "Exclusion added");
        self.events.publish(ConfigUpdateEvent::ExclusionAdded {
            kind,
            value: value.to_string(),
        });
        Ok(snapshot)
    }

    /// Remove a process name or prefix from the exclusions. Returns whether it
    /// was listed.
    pub fn remove_exclusion(&self, kind: ExclusionKind, value: &str) -> Result<bool> {
        let value = value.trim();
        let mut removed = false;
        self.mutate_exclusions(|record| {
            removed = record.remove(kind, value);
            removed
        })?;

        if removed {
            info!(%kind, value, "Exclusion removed");
            self.events.publish(ConfigUpdateEvent::ExclusionRemoved {
                kind,
                value: value.to_string(),
            });
        }
        Ok(removed)
    }

    /// Exclusion counterpart of [`Self::mutate_mapping`].
    fn mutate_exclusions(
        &self,
        f: impl FnOnce(&mut ExclusionRecord) -> bool,
    ) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.write_lock.lock();

        match &self.paths {
            Some(paths) => {
                let mut record = ExclusionRecord::read(&paths.exclusions)?;
                if !f(&mut record) {
                    return Ok(self.snapshot());
                }
                record.write(&paths.exclusions)?;
                Ok(self.reload())
            }
            None => {
                let current = self.snapshot();
                let mut record = current.exclusion_record.clone();
                if !f(&mut record) {
                    return Ok(current);
                }
                Ok(self.install(current.mapping.clone(), record))
            }
        }
    }

    /// Apply `f` to the mapping record and persist it.
    ///
    /// File-backed stores read the record from disk first, so edits made
    /// outside the store are not lost. `f` returns whether anything changed.
    fn mutate_mapping(
        &self,
        f: impl FnOnce(&mut MappingRecord) -> bool,
    ) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.write_lock.lock();

        match &self.paths {
            Some(paths) => {
                let mut record = MappingRecord::read(&paths.mapping)?;
                if !f(&mut record) {
                    return Ok(self.snapshot());
                }
                record.write(&paths.mapping)?;
                Ok(self.reload())
            }
            None => {
                let current = self.snapshot();
                let mut record = current.mapping.clone();
                if !f(&mut record) {
                    return Ok(current);
                }
                Ok(self.install(record, current.exclusion_record.clone()))
            }
        }
    }
}
