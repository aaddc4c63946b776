//! Soft-delete holding area.
//!
//! A deleted entry file is moved, under its original filename (suffixed with
//! its id if a pending deletion already holds that name), into the holding
//! directory and a [`Tombstone`] records where it came from and when
//! its undo window closes. Tombstones are kept in `tombstones.json` inside the
//! holding area so pending deletions survive a restart.

use super::write_atomic;
use crate::constants::TOMBSTONE_FILE_NAME;
use crate::entry::{id_prefix, EntryMetadata};
use crate::errors::{AppError, AppResult, EntryError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Record of a pending deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub id: String,
    pub title: String,
    /// Where the entry lived before deletion and where restore puts it back.
    pub original_path: PathBuf,
    /// Where the entry is held meanwhile.
    pub held_path: PathBuf,
    pub deleted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Lifecycle of an entry with respect to deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionState {
    /// Present in the store (or never deleted).
    Active,
    /// In the holding area; restorable until `expires_at`.
    PendingDelete { expires_at: DateTime<Utc> },
    /// Brought back from the holding area.
    Restored,
    /// Removed for good after the undo window closed.
    Purged,
}

pub(super) struct TrashBin {
    dir: PathBuf,
    undo_window: Duration,
    pending: BTreeMap<String, Tombstone>,
    resolved: HashMap<String, DeletionState>,
}

impl TrashBin {
    pub(super) fn open(dir: PathBuf, undo_window: Duration) -> AppResult<Self> {
        super::ensure_directory_exists(&dir)?;
        let pending = load_tombstones(&dir.join(TOMBSTONE_FILE_NAME));
        debug!("Holding area {:?} has {} pending deletions", dir, pending.len());

        Ok(Self {
            dir,
            undo_window,
            pending,
            resolved: HashMap::new(),
        })
    }

    pub(super) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(super) fn hold(
        &mut self,
        metadata: &EntryMetadata,
        now: DateTime<Utc>,
    ) -> AppResult<Tombstone> {
        let file_name = metadata.path.file_name().ok_or_else(|| {
            AppError::Journal(format!("Entry {} has no file name", metadata.id))
        })?;
        let held_path = self.free_held_path(Path::new(file_name), &metadata.id);

        if held_path.exists() {
            debug!("Replacing stale held file {:?}", held_path);
            fs::remove_file(&held_path)?;
        }
        move_file(&metadata.path, &held_path)?;

        let tombstone = Tombstone {
            id: metadata.id.clone(),
            title: metadata.title.clone(),
            original_path: metadata.path.clone(),
            held_path,
            deleted_at: now,
            expires_at: now + self.undo_window,
        };
        self.pending.insert(tombstone.id.clone(), tombstone.clone());
        self.resolved.remove(&tombstone.id);
        self.persist()?;
        Ok(tombstone)
    }

    /// Picks a holding-area name no pending tombstone owns, suffixing the
    /// entry id when an earlier deletion already holds the plain filename.
    fn free_held_path(&self, file_name: &Path, id: &str) -> PathBuf {
        let stem = file_name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = file_name
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let candidates = [
            self.dir.join(file_name),
            self.dir.join(format!("{}-{}{}", stem, id_prefix(id), ext)),
            self.dir.join(format!("{}-{}{}", stem, id, ext)),
        ];
        let owned = |path: &PathBuf| self.pending.values().any(|t| &t.held_path == path);
        let [plain, short, full] = candidates;
        [plain, short].into_iter().find(|path| !owned(path)).unwrap_or(full)
    }

    pub(super) fn release(&mut self, id: &str, now: DateTime<Utc>) -> AppResult<PathBuf> {
        let Some(tombstone) = self.pending.get(id).cloned() else {
            return Err(match self.resolved.get(id) {
                Some(DeletionState::Purged) => EntryError::DeletionExpired {
                    id: id.to_string(),
                    expired_at: now,
                },
                _ => EntryError::NotFound(id.to_string()),
            }
            .into());
        };

        if now > tombstone.expires_at {
            self.purge(&tombstone)?;
            self.persist()?;
            return Err(EntryError::DeletionExpired {
                id: id.to_string(),
                expired_at: tombstone.expires_at,
            }
            .into());
        }

        if let Some(parent) = tombstone.original_path.parent() {
            super::ensure_directory_exists(parent)?;
        }
        if tombstone.original_path.exists() {
            return Err(AppError::Journal(format!(
                "Cannot restore entry {}: {} is occupied",
                id,
                tombstone.original_path.display()
            )));
        }
        move_file(&tombstone.held_path, &tombstone.original_path)?;

        self.pending.remove(id);
        self.resolved.insert(id.to_string(), DeletionState::Restored);
        self.persist()?;
        Ok(tombstone.original_path)
    }

    pub(super) fn purge_expired(&mut self, now: DateTime<Utc>) -> AppResult<usize> {
        let expired: Vec<Tombstone> = self
            .pending
            .values()
            .filter(|t| now > t.expires_at)
            .cloned()
            .collect();

        for tombstone in &expired {
            self.purge(tombstone)?;
        }
        if !expired.is_empty() {
            self.persist()?;
            info!("Purged {} expired deletions", expired.len());
        }
        Ok(expired.len())
    }

    pub(super) fn state(&self, id: &str, now: DateTime<Utc>) -> DeletionState {
        if let Some(tombstone) = self.pending.get(id) {
            if now > tombstone.expires_at {
                return DeletionState::Purged;
            }
            return DeletionState::PendingDelete {
                expires_at: tombstone.expires_at,
            };
        }
        self.resolved
            .get(id)
            .copied()
            .unwrap_or(DeletionState::Active)
    }

    pub(super) fn pending(&self) -> Vec<Tombstone> {
        self.pending.values().cloned().collect()
    }

    fn purge(&mut self, tombstone: &Tombstone) -> AppResult<()> {
        match fs::remove_file(&tombstone.held_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.pending.remove(&tombstone.id);
        self.resolved
            .insert(tombstone.id.clone(), DeletionState::Purged);
        debug!("Purged held entry {}", tombstone.id);
        Ok(())
    }

    fn persist(&self) -> AppResult<()> {
        let tombstones: Vec<&Tombstone> = self.pending.values().collect();
        let json = serde_json::to_vec_pretty(&tombstones)?;
        write_atomic(&self.dir.join(TOMBSTONE_FILE_NAME), &json)
    }
}

fn load_tombstones(path: &Path) -> BTreeMap<String, Tombstone> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!("Could not read {:?}: {}", path, e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_slice::<Vec<Tombstone>>(&bytes) {
        Ok(list) => list.into_iter().map(|t| (t.id.clone(), t)).collect(),
        Err(e) => {
            warn!("Ignoring unreadable tombstone file {:?}: {}", path, e);
            BTreeMap::new()
        }
    }
}

/// Renames `from` to `to`, copying across filesystems when needed.
fn move_file(from: &Path, to: &Path) -> AppResult<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(e.into()),
        Err(rename_err) => {
            debug!("Rename {:?} -> {:?} failed ({}), copying", from, to, rename_err);
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(())
        }
    }
}
