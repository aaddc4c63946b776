//! Per-entry actions beyond editing: duplicate, export and housekeeping.

use super::Journal;
use crate::entry::Entry;
use crate::errors::{AppError, AppResult};
use crate::store;
use clap::ValueEnum;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Output format for [`Journal::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// The entry file as stored, front matter included.
    #[default]
    Markdown,
    /// Only the text the user wrote.
    Text,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Markdown => write!(f, "markdown"),
            ExportFormat::Text => write!(f, "text"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(AppError::Journal(format!(
                "Unknown export format '{}'. Use 'markdown' or 'text'",
                other
            ))),
        }
    }
}

impl Journal {
    /// Saves a copy of entry `id` as a new entry with its own id and
    /// timestamps. Content and tags are carried over.
    pub fn duplicate(&mut self, id: &str) -> AppResult<Entry> {
        let source = self.get(id)?;
        let mut copy = Entry::new(self.store.clock().now(), source.content);
        copy.metadata.tags = source.metadata.tags;

        self.save(&mut copy)?;
        info!("Duplicated entry {} as {}", id, copy.id());
        Ok(copy)
    }

    /// Writes entry `id` to `destination`, creating parent directories.
    pub fn export(&mut self, id: &str, destination: &Path, format: ExportFormat) -> AppResult<()> {
        let entry = self.get(id)?;
        let contents = match format {
            ExportFormat::Markdown => store::render(&entry)?,
            ExportFormat::Text => entry.content,
        };

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(destination, contents)?;
        info!("Exported entry {} as {} to {:?}", id, format, destination);
        Ok(())
    }

    /// Permanently removes entries whose content is blank. Returns their ids.
    pub fn cleanup_empty(&mut self) -> AppResult<Vec<String>> {
        let blank: Vec<Entry> = self
            .store
            .list_all()
            .filter(|entry| entry.is_blank())
            .collect();

        let mut removed = Vec::with_capacity(blank.len());
        for entry in blank {
            let before = self.store.generation();
            self.store.remove(&entry)?;
            let after = self.store.generation();

            if self.index.generation() == Some(before) {
                self.index.remove(entry.id());
                self.index.mark_current(after);
            }
            if self.recent.generation() == Some(before) {
                self.recent.remove(entry.id());
                self.recent.mark_current(after);
            }
            debug!("Removed empty entry {}", entry.id());
            removed.push(entry.metadata.id);
        }

        if !removed.is_empty() {
            info!("Removed {} empty entries", removed.len());
        }
        Ok(removed)
    }
}
