//! File-backed entry storage.
//!
//! Every entry lives in its own markdown file under `<root>/<YYYY>/<MM>/`,
//! named `<created_at>_<slug>.md`, beginning with a YAML front-matter header:
//!
//! ```text
//! ---
//! id: 6f1c2a9e-...
//! created_at: 2024-01-15T14:30:00Z
//! ...
//! ---
//!
//! raw entry text
//! ```
//!
//! Writes go to a temporary file in the destination directory and are renamed
//! into place, so an interrupted save never corrupts the previous version.
//! Deleted entries are moved to a holding area and can be restored until
//! their undo window closes.

mod format;
mod trash;

pub(crate) use format::render;
pub use trash::{DeletionState, Tombstone};

use crate::clock::{Clock, SystemClock};
use crate::constants::{
    DEFAULT_TRASH_DIR_NAME, DEFAULT_UNDO_WINDOW_SECS, ENTRY_FILE_EXTENSION,
    FILENAME_TIMESTAMP_FORMAT, MONTH_DIR_FORMAT, YEAR_DIR_FORMAT,
};
use crate::entry::{file_slug, id_prefix, Entry, EntryMetadata};
use crate::errors::{AppError, AppResult, EntryError};
use std::collections::{HashMap, HashSet};
use std::fs;
#[cfg(unix)]
use std::fs::Permissions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Settings for opening an [`EntryStore`].
#[derive(Clone)]
pub struct StoreOptions {
    /// Directory holding the year/month tree of entries.
    pub root: PathBuf,
    /// Holding area for soft-deleted entries. Defaults to `<root>/.trash`.
    pub trash_dir: Option<PathBuf>,
    /// How long a deleted entry stays restorable.
    pub undo_window: Duration,
    /// Source of timestamps.
    pub clock: Arc<dyn Clock>,
}

impl StoreOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            trash_dir: None,
            undo_window: Duration::from_secs(DEFAULT_UNDO_WINDOW_SECS),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn trash_dir(mut self, trash_dir: impl Into<PathBuf>) -> Self {
        self.trash_dir = Some(trash_dir.into());
        self
    }

    pub fn undo_window(mut self, undo_window: Duration) -> Self {
        self.undo_window = undo_window;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Durable store of journal entries.
pub struct EntryStore {
    root: PathBuf,
    trash: trash::TrashBin,
    clock: Arc<dyn Clock>,
    paths_by_id: HashMap<String, PathBuf>,
    generation: u64,
    reported_corrupt: Mutex<HashSet<PathBuf>>,
    warnings: Mutex<Vec<EntryError>>,
}

impl EntryStore {
    /// Opens (creating if needed) the store described by `options`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the root is not absolute, or
    /// `AppError::Io` if the directories cannot be created.
    pub fn open(options: StoreOptions) -> AppResult<Self> {
        ensure_directory_exists(&options.root)?;

        let trash_dir = options
            .trash_dir
            .unwrap_or_else(|| options.root.join(DEFAULT_TRASH_DIR_NAME));
        let undo_window = chrono::Duration::from_std(options.undo_window)
            .map_err(|e| AppError::Config(format!("Undo window out of range: {}", e)))?;
        let trash = trash::TrashBin::open(trash_dir, undo_window)?;

        debug!("Opened entry store at {:?}", options.root);

        Ok(Self {
            root: options.root,
            trash,
            clock: options.clock,
            paths_by_id: HashMap::new(),
            generation: 0,
            reported_corrupt: Mutex::new(HashSet::new()),
            warnings: Mutex::new(Vec::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn trash_dir(&self) -> &Path {
        self.trash.dir()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Counter bumped by every mutation of the active entry set.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Persists `entry` and returns its final path.
    ///
    /// Derived metadata is recomputed and `updated_at` is stamped with the
    /// current time. If the title changed since the last save, the entry moves
    /// to its new filename and the old file is removed after the new one is in
    /// place. On failure the entry's metadata is left as it was.
    pub fn save(&mut self, entry: &mut Entry) -> AppResult<PathBuf> {
        let previous = entry.metadata.clone();

        entry.refresh_derived();
        entry.touch(self.clock.now());

        let target = self.target_path(&entry.metadata);
        entry.metadata.path = target.clone();

        if let Err(e) = self.write_entry(entry, &target) {
            entry.metadata = previous;
            return Err(e);
        }

        let old_path = &previous.path;
        if previous.is_persisted() && *old_path != target && old_path.exists() {
            debug!("Entry {} moved from {:?} to {:?}", entry.id(), old_path, target);
            if let Err(e) = fs::remove_file(old_path) {
                warn!("Could not remove previous file {:?}: {}", old_path, e);
            }
        }

        self.paths_by_id.insert(entry.id().to_string(), target.clone());
        self.generation += 1;
        debug!("Saved entry {} to {:?}", entry.id(), target);
        Ok(target)
    }

    /// Loads the entry stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns `EntryError::Corrupt` (wrapped in `AppError::Entry`) when the
    /// header is missing or malformed; the file is not modified.
    pub fn load(&self, path: &Path) -> AppResult<Entry> {
        let text = read_entry_text(path)?;
        let (metadata, body) = format::parse(path, &text)?;
        Ok(Entry::from_parts(metadata, body.to_string()))
    }

    /// Loads only the header of the entry stored at `path`.
    pub fn load_metadata(&self, path: &Path) -> AppResult<EntryMetadata> {
        let text = read_entry_text(path)?;
        let (metadata, _) = format::parse(path, &text)?;
        Ok(metadata)
    }

    /// Lazily yields every stored entry file as a load result.
    ///
    /// The holding area and hidden directories are skipped. The iterator reads
    /// the filesystem as it goes, so calling this again reflects current state.
    pub fn entries(&self) -> impl Iterator<Item = AppResult<Entry>> + '_ {
        self.entry_paths().map(move |path| self.load(&path))
    }

    /// Lazily yields every readable entry. Corrupt files are skipped and
    /// reported once each; see [`take_warnings`](Self::take_warnings).
    pub fn list_all(&self) -> impl Iterator<Item = Entry> + '_ {
        self.entries().filter_map(move |result| self.keep_or_report(result))
    }

    /// Like [`list_all`](Self::list_all) without retaining entry bodies.
    pub fn list_metadata(&self) -> impl Iterator<Item = EntryMetadata> + '_ {
        self.entry_paths()
            .filter_map(move |path| self.keep_or_report(self.load_metadata(&path)))
    }

    /// Corrupt-entry warnings not yet handed to the caller.
    pub fn take_warnings(&self) -> Vec<EntryError> {
        std::mem::take(&mut *self.warnings.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Finds the active entry with the given id.
    pub fn find(&mut self, id: &str) -> AppResult<Entry> {
        if let Some(path) = self.paths_by_id.get(id) {
            if let Ok(entry) = self.load(path) {
                if entry.id() == id {
                    return Ok(entry);
                }
            }
        }

        debug!("Entry {} not cached, rescanning store", id);
        let mut found = None;
        let mut paths = HashMap::new();
        for entry in self.list_all() {
            if entry.id() == id {
                found = Some(entry.clone());
            }
            paths.insert(entry.metadata.id, entry.metadata.path);
        }
        self.paths_by_id = paths;

        found.ok_or_else(|| EntryError::NotFound(id.to_string()).into())
    }

    /// Removes an entry file outright. Used for housekeeping of empty entries;
    /// user-facing deletion goes through [`soft_delete`](Self::soft_delete).
    pub fn remove(&mut self, entry: &Entry) -> AppResult<()> {
        fs::remove_file(&entry.metadata.path)?;
        self.paths_by_id.remove(entry.id());
        self.generation += 1;
        info!("Removed entry {} at {:?}", entry.id(), entry.metadata.path);
        Ok(())
    }

    /// Moves the entry to the holding area. It can be restored until the
    /// returned tombstone's `expires_at`.
    pub fn soft_delete(&mut self, id: &str) -> AppResult<Tombstone> {
        let entry = self.find(id)?;
        let now = self.clock.now();
        let tombstone = self.trash.hold(&entry.metadata, now)?;

        self.paths_by_id.remove(id);
        self.generation += 1;
        info!(
            "Deleted entry {}; restorable until {}",
            id, tombstone.expires_at
        );
        Ok(tombstone)
    }

    /// Moves a deleted entry back to its original location.
    ///
    /// # Errors
    ///
    /// `EntryError::DeletionExpired` once the undo window has closed (the
    /// held file is purged and not restored), `EntryError::NotFound` if the
    /// id was never deleted.
    pub fn restore(&mut self, id: &str) -> AppResult<PathBuf> {
        let now = self.clock.now();
        let path = self.trash.release(id, now)?;

        self.paths_by_id.insert(id.to_string(), path.clone());
        self.generation += 1;
        info!("Restored entry {} to {:?}", id, path);
        Ok(path)
    }

    /// Permanently removes held entries whose undo window has closed.
    pub fn purge_expired(&mut self) -> AppResult<usize> {
        let now = self.clock.now();
        self.trash.purge_expired(now)
    }

    /// Where the given id stands in the soft-delete lifecycle.
    pub fn deletion_state(&self, id: &str) -> DeletionState {
        self.trash.state(id, self.clock.now())
    }

    /// Deletions that can still be undone.
    pub fn pending_deletions(&self) -> Vec<Tombstone> {
        self.trash.pending()
    }

    fn entry_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        let trash_dir = self.trash.dir().to_path_buf();
        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |e| {
                e.depth() == 0 || (e.path() != trash_dir && !is_hidden(e.file_name()))
            })
            .filter_map(|e| match e {
                Ok(e) => Some(e),
                Err(err) => {
                    debug!("Skipping unreadable path in store: {}", err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == ENTRY_FILE_EXTENSION))
    }

    fn keep_or_report<T>(&self, result: AppResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(AppError::Entry(EntryError::Corrupt { path, reason })) => {
                let first_time = self
                    .reported_corrupt
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(path.clone());
                if first_time {
                    warn!("Skipping corrupt entry {:?}: {}", path, reason);
                    self.warnings
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push(EntryError::Corrupt { path, reason });
                }
                None
            }
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        }
    }

    /// Deterministic location for an entry: `<root>/YYYY/MM/<ts>_<slug>.md`,
    /// with the id prefix appended when another file already holds the name.
    fn target_path(&self, metadata: &EntryMetadata) -> PathBuf {
        let created = metadata.created_at;
        let dir = self
            .root
            .join(created.format(YEAR_DIR_FORMAT).to_string())
            .join(created.format(MONTH_DIR_FORMAT).to_string());
        let stem = format!(
            "{}_{}",
            created.format(FILENAME_TIMESTAMP_FORMAT),
            file_slug(metadata)
        );

        let candidate = dir.join(format!("{}.{}", stem, ENTRY_FILE_EXTENSION));
        if candidate == metadata.path || !candidate.exists() {
            return candidate;
        }

        dir.join(format!(
            "{}-{}.{}",
            stem,
            id_prefix(&metadata.id),
            ENTRY_FILE_EXTENSION
        ))
    }

    fn write_entry(&self, entry: &Entry, target: &Path) -> AppResult<()> {
        let rendered = format::render(entry)?;
        let dir = target
            .parent()
            .ok_or_else(|| AppError::Journal(format!("Invalid entry path: {}", target.display())))?;
        ensure_directory_exists(dir)?;
        write_atomic(target, rendered.as_bytes())
    }
}

/// Creates `dir` (and parents) with owner-only permissions if it is missing.
///
/// # Errors
///
/// - `AppError::Config` if the path is not absolute
/// - `AppError::Io` if the directory cannot be created
pub fn ensure_directory_exists(dir: &Path) -> AppResult<()> {
    if !dir.is_absolute() {
        return Err(AppError::Config(format!(
            "Entries directory path must be absolute: {}",
            dir.display()
        )));
    }

    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create directory {}: {}", dir.display(), e),
            ))
        })?;

        #[cfg(unix)]
        {
            let permissions = Permissions::from_mode(crate::constants::DEFAULT_DIR_PERMISSIONS);
            fs::set_permissions(dir, permissions)?;
            debug!("Set 0o700 permissions on {:?}", dir);
        }
    }
    Ok(())
}

/// Writes `bytes` to `target` through a temp file in the same directory and
/// an atomic rename.
pub(crate) fn write_atomic(target: &Path, bytes: &[u8]) -> AppResult<()> {
    let dir = target
        .parent()
        .ok_or_else(|| AppError::Journal(format!("Invalid path: {}", target.display())))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        let permissions = Permissions::from_mode(crate::constants::DEFAULT_FILE_PERMISSIONS);
        tmp.as_file().set_permissions(permissions)?;
    }

    tmp.persist(target).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

fn read_entry_text(path: &Path) -> AppResult<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(EntryError::Corrupt {
            path: path.to_path_buf(),
            reason: "file is not valid UTF-8".to_string(),
        }
        .into()),
        Err(e) => Err(e.into()),
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}
