//! Debounced autosave for the entry being edited.
//!
//! [`Autosave`] is a small state machine:
//!
//! ```text
//! Empty --first non-blank edit--> Dirty --deadline/focus/shutdown--> Saving
//!   ^                               ^                                  |
//!   |                               +----- edit during save / error ---+
//!   |                                                                  v
//!   +------------------ new_entry ------------------------------- Saved
//! ```
//!
//! Time is passed in as [`Instant`]s, so the machine does not own a timer:
//! the caller asks for [`Autosave::next_deadline`] and calls
//! [`Autosave::tick`] when it passes. Every edit pushes the deadline out by
//! the debounce interval, so a burst of keystrokes produces one write.
//!
//! Writes go through the [`Persist`] seam. [`Autosave::flush`] runs a save
//! inline; [`Autosave::begin_save`] and [`Autosave::finish_save`] split it so
//! the write can run elsewhere while edits keep arriving.

use crate::clock::Clock;
use crate::entry::Entry;
use crate::errors::{AppError, AppResult};
use crate::store::EntryStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Something that can durably commit an entry.
pub trait Persist {
    /// Writes `entry`, updating its derived metadata and path in place.
    fn persist(&mut self, entry: &mut Entry) -> AppResult<PathBuf>;
}

impl Persist for EntryStore {
    fn persist(&mut self, entry: &mut Entry) -> AppResult<PathBuf> {
        self.save(entry)
    }
}

/// Where the lifecycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// No entry exists yet; nothing has been typed.
    Empty,
    /// In-memory content is newer than what is on disk.
    Dirty,
    /// A write is in flight.
    Saving,
    /// Disk matches memory.
    Saved,
    /// Shut down; edits are ignored.
    Closed,
}

/// Notifications for the save indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    EntryCreated { id: String },
    SaveStarted { id: String },
    Saved { id: String, path: PathBuf },
    SaveFailed { id: String, message: String },
}

/// A save handed out by [`Autosave::begin_save`].
#[derive(Debug, Clone)]
pub struct SaveJob {
    entry: Entry,
    revision: u64,
}

impl SaveJob {
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    /// Runs the job against `sink`.
    pub fn run<P: Persist + ?Sized>(&mut self, sink: &mut P) -> AppResult<PathBuf> {
        sink.persist(&mut self.entry)
    }
}

pub struct Autosave {
    state: SaveState,
    entry: Option<Entry>,
    debounce: Duration,
    deadline: Option<Instant>,
    revision: u64,
    flush_requested: bool,
    last_error: Option<String>,
    events: Vec<SaveEvent>,
    clock: Arc<dyn Clock>,
}

impl Autosave {
    /// A lifecycle with no entry; one is created on the first non-blank edit.
    pub fn new(debounce: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: SaveState::Empty,
            entry: None,
            debounce,
            deadline: None,
            revision: 0,
            flush_requested: false,
            last_error: None,
            events: Vec::new(),
            clock,
        }
    }

    /// A lifecycle editing an entry that is already on disk.
    pub fn with_entry(debounce: Duration, clock: Arc<dyn Clock>, entry: Entry) -> Self {
        let mut autosave = Self::new(debounce, clock);
        autosave.adopt(entry);
        autosave
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// When the pending save is due, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Message of the most recent failed save, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True when a forced save arrived while a split save was in flight.
    pub fn flush_pending(&self) -> bool {
        self.flush_requested && self.state == SaveState::Dirty
    }

    pub fn drain_events(&mut self) -> Vec<SaveEvent> {
        std::mem::take(&mut self.events)
    }

    /// Records the editor's current text.
    pub fn edit(&mut self, text: &str, now: Instant) {
        match self.state {
            SaveState::Closed => {
                warn!("Ignoring edit after the editor was closed");
            }
            SaveState::Empty => {
                if text.trim().is_empty() {
                    return;
                }
                let entry = Entry::new(self.clock.now(), text);
                debug!("Created entry {} on first edit", entry.id());
                self.events.push(SaveEvent::EntryCreated {
                    id: entry.id().to_string(),
                });
                self.entry = Some(entry);
                self.mark_changed(now);
                self.state = SaveState::Dirty;
            }
            SaveState::Dirty | SaveState::Saving | SaveState::Saved => {
                let Some(entry) = self.entry.as_mut() else {
                    return;
                };
                if entry.content == text {
                    return;
                }
                entry.set_content(text);
                self.mark_changed(now);
                if self.state != SaveState::Saving {
                    self.state = SaveState::Dirty;
                }
            }
        }
    }

    /// Saves if the debounce deadline has passed. Returns whether a write
    /// completed.
    pub fn tick<P: Persist + ?Sized>(&mut self, now: Instant, sink: &mut P) -> AppResult<bool> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                if self.state == SaveState::Saving {
                    // Stays armed so the first tick after the write picks it up.
                    self.flush_requested = true;
                    return Ok(false);
                }
                self.deadline = None;
                Ok(self.flush(sink)?.is_some())
            }
            _ => Ok(false),
        }
    }

    /// The editor lost focus: save now.
    pub fn focus_lost<P: Persist + ?Sized>(&mut self, sink: &mut P) -> AppResult<Option<PathBuf>> {
        self.flush(sink)
    }

    /// Saves immediately if there are unsaved changes.
    ///
    /// While a split save is in flight the request is queued instead; see
    /// [`flush_pending`](Self::flush_pending).
    pub fn flush<P: Persist + ?Sized>(&mut self, sink: &mut P) -> AppResult<Option<PathBuf>> {
        if self.state == SaveState::Saving {
            debug!("Save in flight; queueing flush");
            self.flush_requested = true;
            return Ok(None);
        }

        let Some(mut job) = self.begin_save() else {
            return Ok(None);
        };
        let result = job.run(sink);
        self.finish_save(job, result).map(Some)
    }

    /// Flushes, then stops accepting edits. Blocks for as long as the write
    /// takes; if it fails the lifecycle stays open so nothing is lost.
    pub fn shutdown<P: Persist + ?Sized>(&mut self, sink: &mut P) -> AppResult<Option<PathBuf>> {
        let saved = self.flush(sink)?;
        if self.state == SaveState::Saving {
            return Err(AppError::Journal(
                "Cannot shut down while a save is in flight".to_string(),
            ));
        }
        self.close_now();
        Ok(saved)
    }

    /// Shuts down and hands back the entry being edited.
    pub fn close<P: Persist + ?Sized>(&mut self, sink: &mut P) -> AppResult<Option<Entry>> {
        self.shutdown(sink)?;
        Ok(self.entry.take())
    }

    /// Flushes the current entry and starts over with nothing typed.
    pub fn new_entry<P: Persist + ?Sized>(&mut self, sink: &mut P) -> AppResult<()> {
        self.flush(sink)?;
        if self.state == SaveState::Saving {
            return Err(AppError::Journal(
                "Cannot start a new entry while a save is in flight".to_string(),
            ));
        }
        self.reset();
        Ok(())
    }

    /// Flushes the current entry and switches to editing `entry`.
    pub fn open<P: Persist + ?Sized>(&mut self, entry: Entry, sink: &mut P) -> AppResult<()> {
        self.flush(sink)?;
        if self.state == SaveState::Saving {
            return Err(AppError::Journal(
                "Cannot open another entry while a save is in flight".to_string(),
            ));
        }
        self.reset();
        self.adopt(entry);
        Ok(())
    }

    /// Starts a save of the current content, if one is needed.
    pub fn begin_save(&mut self) -> Option<SaveJob> {
        if self.state != SaveState::Dirty {
            return None;
        }
        let entry = self.entry.clone()?;

        self.state = SaveState::Saving;
        self.deadline = None;
        self.flush_requested = false;
        self.events.push(SaveEvent::SaveStarted {
            id: entry.id().to_string(),
        });
        Some(SaveJob {
            entry,
            revision: self.revision,
        })
    }

    /// Completes a save started by [`begin_save`](Self::begin_save).
    ///
    /// # Errors
    ///
    /// `AppError::SaveFailed` wrapping the write error. The lifecycle returns
    /// to `Dirty` and keeps the content for the next attempt.
    pub fn finish_save(&mut self, job: SaveJob, result: AppResult<PathBuf>) -> AppResult<PathBuf> {
        let saved = self.settle(job, result);

        // A trigger that arrived mid-write is due as soon as the write lands.
        if self.state == SaveState::Dirty && self.flush_requested && self.deadline.is_none() {
            self.deadline = Some(Instant::now());
        }
        saved
    }

    fn settle(&mut self, job: SaveJob, result: AppResult<PathBuf>) -> AppResult<PathBuf> {
        let id = job.entry.id().to_string();
        let closed = self.state == SaveState::Closed;

        match result {
            Ok(path) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.metadata = job.entry.metadata;
                }
                self.last_error = None;
                self.events.push(SaveEvent::Saved {
                    id: id.clone(),
                    path: path.clone(),
                });
                if !closed {
                    self.state = if self.revision == job.revision {
                        SaveState::Saved
                    } else {
                        SaveState::Dirty
                    };
                }
                info!("Autosaved entry {} to {:?}", id, path);
                Ok(path)
            }
            Err(e) => {
                warn!("Autosave of entry {} failed: {}", id, e);
                self.last_error = Some(e.to_string());
                self.events.push(SaveEvent::SaveFailed {
                    id: id.clone(),
                    message: e.to_string(),
                });
                if !closed {
                    self.state = SaveState::Dirty;
                }
                Err(AppError::SaveFailed {
                    id,
                    source: Box::new(e),
                })
            }
        }
    }

    fn mark_changed(&mut self, now: Instant) {
        self.revision += 1;
        self.deadline = Some(now + self.debounce);
    }

    fn adopt(&mut self, entry: Entry) {
        self.entry = Some(entry);
        self.state = SaveState::Saved;
    }

    fn reset(&mut self) {
        self.entry = None;
        self.state = SaveState::Empty;
        self.deadline = None;
        self.flush_requested = false;
        self.last_error = None;
    }

    fn close_now(&mut self) {
        self.state = SaveState::Closed;
        self.deadline = None;
        debug!("Autosave closed");
    }
}
