//! The journal: one entry store plus the search and recency projections.
//!
//! [`Journal`] is what the command-line driver (or any other front end)
//! talks to. Every mutation goes through the store first and is then applied
//! to the in-memory projections, so search results and the recent list never
//! show a deleted entry or miss a saved one. When a projection falls behind
//! the store's generation counter it is rebuilt from disk on next use.
//!
//! The journal holds an exclusive lock file in the entries directory for its
//! lifetime, so two processes never write the same tree.

pub mod actions;

#[cfg(test)]
mod tests;

pub use actions::ExportFormat;

use crate::autosave::{Autosave, Persist};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::constants::LOCK_FILE_NAME;
use crate::entry::{Entry, EntryMetadata};
use crate::errors::{AppError, AppResult, EntryError, LockError};
use crate::recency::{newest_first, RecencyView};
use crate::search::{SearchIndex, SearchResult};
use crate::store::{DeletionState, EntryStore, Tombstone};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Exclusive hold on an entries directory, released on drop.
struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    fn acquire(root: &Path) -> Result<Self, LockError> {
        let path = root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| LockError::AcquisitionFailed {
                path: path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired store lock {:?}", path);
                Ok(Self { file, path })
            }
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(LockError::StoreBusy { path })
            }
            Err(source) => Err(LockError::AcquisitionFailed { path, source }),
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("Failed to release store lock {:?}: {}", self.path, e);
        }
    }
}

/// An open journal.
pub struct Journal {
    config: Config,
    store: EntryStore,
    index: SearchIndex,
    recent: RecencyView,
    _lock: StoreLock,
}

impl Journal {
    /// Opens the journal described by `config` using the system clock.
    ///
    /// # Errors
    ///
    /// - `AppError::Config` if the configuration is invalid
    /// - `AppError::Lock` if another process has the journal open
    /// - `AppError::Io` if the directories cannot be created
    pub fn open(config: Config) -> AppResult<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Opens the journal with an explicit time source.
    pub fn open_with_clock(config: Config, clock: Arc<dyn Clock>) -> AppResult<Self> {
        config.validate()?;
        let mut store = EntryStore::open(config.store_options(clock))?;
        let lock = StoreLock::acquire(store.root())?;

        let purged = store.purge_expired()?;
        if purged > 0 {
            info!("Purged {} deletions whose undo window had closed", purged);
        }

        let mut journal = Self {
            recent: RecencyView::new(config.recent_limit),
            index: SearchIndex::new(),
            config,
            store,
            _lock: lock,
        };
        journal.refresh();
        Ok(journal)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(self.store.clock())
    }

    /// A fresh autosave lifecycle using the configured debounce.
    pub fn autosave(&self) -> Autosave {
        Autosave::new(self.config.debounce, self.clock())
    }

    /// An autosave lifecycle editing the existing entry `id`.
    pub fn edit(&mut self, id: &str) -> AppResult<Autosave> {
        let entry = self.store.find(id)?;
        Ok(Autosave::with_entry(self.config.debounce, self.clock(), entry))
    }

    /// Creates and saves a new entry holding `content`.
    pub fn create(&mut self, content: &str) -> AppResult<Entry> {
        let mut entry = Entry::new(self.store.clock().now(), content);
        self.save(&mut entry)?;
        Ok(entry)
    }

    /// Saves `entry` and brings the projections up to date.
    pub fn save(&mut self, entry: &mut Entry) -> AppResult<PathBuf> {
        let before = self.store.generation();
        let path = self.store.save(entry)?;
        let after = self.store.generation();

        if self.index.generation() == Some(before) {
            self.index.upsert(entry);
            self.index.mark_current(after);
        }
        if self.recent.generation() == Some(before) {
            self.recent.record(&entry.metadata);
            self.recent.mark_current(after);
        }
        Ok(path)
    }

    /// The active entry with the given id.
    pub fn get(&mut self, id: &str) -> AppResult<Entry> {
        self.store.find(id)
    }

    /// Expands `prefix` to the full id of the single active entry it starts.
    pub fn resolve_id(&self, prefix: &str) -> AppResult<String> {
        unique_match(prefix, self.store.list_metadata().map(|m| m.id))
    }

    /// Like [`Journal::resolve_id`], but over deletions that can still be undone.
    pub fn resolve_deleted_id(&self, prefix: &str) -> AppResult<String> {
        unique_match(prefix, self.store.pending_deletions().into_iter().map(|t| t.id))
    }

    /// Resolves the id to restore. A prefix with no pending match is passed
    /// through as typed so an expired deletion still reports as expired.
    pub fn resolve_restore_id(&self, typed: &str) -> AppResult<String> {
        match self.resolve_deleted_id(typed) {
            Err(AppError::Entry(EntryError::NotFound(_))) => Ok(typed.to_string()),
            other => other,
        }
    }

    /// Loads the entry stored at `path`.
    pub fn load(&self, path: &Path) -> AppResult<Entry> {
        self.store.load(path)
    }

    /// Ranked search with the configured result limit.
    pub fn search(&mut self, query: &str) -> Vec<SearchResult> {
        let limit = self.config.search_limit;
        self.search_with_limit(query, limit)
    }

    pub fn search_with_limit(&mut self, query: &str, limit: usize) -> Vec<SearchResult> {
        self.ensure_index();
        self.index.search(query, limit)
    }

    /// The `k` most recently updated entries, newest first.
    pub fn recent(&mut self, k: usize) -> Vec<EntryMetadata> {
        if k > self.recent.capacity() {
            debug!("{} recent entries requested, reading from store", k);
            let mut all: Vec<EntryMetadata> = self.store.list_metadata().collect();
            all.sort_by(newest_first);
            all.truncate(k);
            return all;
        }
        self.ensure_recent();
        self.recent.top(k).to_vec()
    }

    /// Soft-deletes an entry. It disappears from listings and search at once
    /// and can be restored until the returned tombstone expires.
    pub fn delete(&mut self, id: &str) -> AppResult<Tombstone> {
        let before = self.store.generation();
        let tombstone = self.store.soft_delete(id)?;
        let after = self.store.generation();

        if self.index.generation() == Some(before) {
            self.index.remove(id);
            self.index.mark_current(after);
        }
        if self.recent.generation() == Some(before) {
            self.recent.remove(id);
            self.recent.mark_current(after);
        }
        Ok(tombstone)
    }

    /// Undoes a deletion within its window and returns the restored entry.
    ///
    /// # Errors
    ///
    /// `EntryError::DeletionExpired` once the window has closed.
    pub fn restore(&mut self, id: &str) -> AppResult<Entry> {
        let before = self.store.generation();
        let path = self.store.restore(id)?;
        let after = self.store.generation();

        let entry = match self.store.load(&path) {
            Ok(entry) => entry,
            Err(e) => {
                self.invalidate();
                return Err(e);
            }
        };
        if self.index.generation() == Some(before) {
            self.index.upsert(&entry);
            self.index.mark_current(after);
        }
        if self.recent.generation() == Some(before) {
            self.recent.record(&entry.metadata);
            self.recent.mark_current(after);
        }
        Ok(entry)
    }

    pub fn deletion_state(&self, id: &str) -> DeletionState {
        self.store.deletion_state(id)
    }

    pub fn pending_deletions(&self) -> Vec<Tombstone> {
        self.store.pending_deletions()
    }

    pub fn purge_expired(&mut self) -> AppResult<usize> {
        self.store.purge_expired()
    }

    /// Rebuilds both projections from disk. Returns the number of entries.
    pub fn refresh(&mut self) -> usize {
        let generation = self.store.generation();
        let entries: Vec<Entry> = self.store.list_all().collect();
        let count = entries.len();

        self.recent
            .rebuild(entries.iter().map(|e| e.metadata.clone()), generation);
        self.index.rebuild(entries, generation);
        info!("Indexed {} entries", count);
        count
    }

    /// Forces both projections to rebuild on next use, e.g. after the
    /// directory was changed behind the journal's back.
    pub fn invalidate(&mut self) {
        self.index.invalidate();
        self.recent.invalidate();
    }

    /// Corrupt-entry warnings gathered since the last call.
    pub fn take_warnings(&self) -> Vec<EntryError> {
        self.store.take_warnings()
    }

    fn ensure_index(&mut self) {
        let generation = self.store.generation();
        if self.index.generation() != Some(generation) {
            debug!("Search index is stale, rebuilding");
            self.index.rebuild(self.store.list_all(), generation);
        }
    }

    fn ensure_recent(&mut self) {
        let generation = self.store.generation();
        if self.recent.generation() != Some(generation) || self.recent.needs_refill() {
            debug!("Recent entries are stale, rebuilding");
            self.recent.rebuild(self.store.list_metadata(), generation);
        }
    }
}

fn unique_match(prefix: &str, ids: impl Iterator<Item = String>) -> AppResult<String> {
    if prefix.is_empty() {
        return Err(EntryError::NotFound(prefix.to_string()).into());
    }
    let mut matches: Vec<String> = ids.filter(|id| id.starts_with(prefix)).collect();
    if let Some(exact) = matches.iter().position(|id| id == prefix) {
        return Ok(matches.swap_remove(exact));
    }
    match matches.len() {
        0 => Err(EntryError::NotFound(prefix.to_string()).into()),
        1 => Ok(matches.remove(0)),
        n => Err(AppError::Journal(format!(
            "Id prefix '{}' matches {} entries; use more characters",
            prefix, n
        ))),
    }
}

impl Persist for Journal {
    fn persist(&mut self, entry: &mut Entry) -> AppResult<PathBuf> {
        self.save(entry)
    }
}
