//! Configuration management for the pocket-journal application.
//!
//! Settings are read from environment variables, with defaults for anything
//! unset. Nothing is ever written back.
//!
//! # Environment Variables
//!
//! - `POCKET_JOURNAL_DIR`: Entries directory (defaults to ~/Documents/PocketJournal/Entries)
//! - `POCKET_JOURNAL_TRASH_DIR`: Holding area for deleted entries (defaults to `<dir>/.trash`)
//! - `POCKET_JOURNAL_DEBOUNCE_MS`: Autosave debounce in milliseconds (defaults to 900)
//! - `POCKET_JOURNAL_UNDO_SECS`: How long a deletion can be undone (defaults to 10)
//! - `POCKET_JOURNAL_RECENT_LIMIT`: Size of the recent entries list (defaults to 10)
//! - `POCKET_JOURNAL_SEARCH_LIMIT`: Maximum search results (defaults to 20)
//! - `HOME`: Used for expanding the default entries directory path

use crate::clock::Clock;
use crate::constants::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_ENTRIES_SUBDIR, DEFAULT_RECENT_LIMIT, DEFAULT_SEARCH_LIMIT,
    DEFAULT_UNDO_WINDOW_SECS, ENV_VAR_DEBOUNCE_MS, ENV_VAR_ENTRIES_DIR, ENV_VAR_HOME,
    ENV_VAR_RECENT_LIMIT, ENV_VAR_SEARCH_LIMIT, ENV_VAR_TRASH_DIR, ENV_VAR_UNDO_SECS,
    MAX_DEBOUNCE_MS, REDACTED_PLACEHOLDER,
};
use crate::errors::{AppError, AppResult};
use crate::store::StoreOptions;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the pocket-journal application.
///
/// # Examples
///
/// Building a configuration for a known directory:
/// ```
/// use pocket_journal::Config;
/// use std::time::Duration;
///
/// let config = Config::for_dir("/path/to/entries");
/// assert_eq!(config.debounce, Duration::from_millis(900));
/// assert!(config.validate().is_ok());
/// ```
///
/// Loading configuration from environment variables:
/// ```no_run
/// use pocket_journal::Config;
/// use std::env;
///
/// env::set_var("POCKET_JOURNAL_DIR", "/custom/journal/path");
///
/// let config = Config::load().expect("Failed to load configuration");
/// assert_eq!(config.entries_dir.to_str(), Some("/custom/journal/path"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the year/month tree of entry files.
    pub entries_dir: PathBuf,

    /// Holding area for soft-deleted entries. `None` means `<entries_dir>/.trash`.
    pub trash_dir: Option<PathBuf>,

    /// Quiet period after the last edit before an autosave.
    pub debounce: Duration,

    /// How long a deletion stays restorable.
    pub undo_window: Duration,

    /// Number of entries in the recent list.
    pub recent_limit: usize,

    /// Maximum number of search results.
    pub search_limit: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("entries_dir", &REDACTED_PLACEHOLDER)
            .field(
                "trash_dir",
                &self.trash_dir.as_ref().map(|_| REDACTED_PLACEHOLDER),
            )
            .field("debounce", &self.debounce)
            .field("undo_window", &self.undo_window)
            .field("recent_limit", &self.recent_limit)
            .field("search_limit", &self.search_limit)
            .finish()
    }
}

impl Default for Config {
    /// Default settings with an empty entries directory.
    fn default() -> Self {
        Config {
            entries_dir: PathBuf::new(),
            trash_dir: None,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            undo_window: Duration::from_secs(DEFAULT_UNDO_WINDOW_SECS),
            recent_limit: DEFAULT_RECENT_LIMIT,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Config {
    /// Default settings rooted at `entries_dir`.
    pub fn for_dir(entries_dir: impl Into<PathBuf>) -> Self {
        Config {
            entries_dir: entries_dir.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// Directory values are expanded with `shellexpand`, so `~` and `$VAR`
    /// references work.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if:
    /// - a path expansion fails or yields an empty path
    /// - a numeric variable does not parse
    /// - the resulting configuration fails [`validate`](Self::validate)
    pub fn load() -> AppResult<Self> {
        let entries_dir_str = env::var(ENV_VAR_ENTRIES_DIR).unwrap_or_else(|_| {
            let home = env::var(ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, DEFAULT_ENTRIES_SUBDIR)
        });
        let entries_dir = expand_path(&entries_dir_str)?;

        let trash_dir = match env::var(ENV_VAR_TRASH_DIR) {
            Ok(raw) if !raw.trim().is_empty() => Some(expand_path(&raw)?),
            _ => None,
        };

        let config = Config {
            entries_dir,
            trash_dir,
            debounce: Duration::from_millis(env_number(ENV_VAR_DEBOUNCE_MS, DEFAULT_DEBOUNCE_MS)?),
            undo_window: Duration::from_secs(env_number(
                ENV_VAR_UNDO_SECS,
                DEFAULT_UNDO_WINDOW_SECS,
            )?),
            recent_limit: env_number(ENV_VAR_RECENT_LIMIT, DEFAULT_RECENT_LIMIT)?,
            search_limit: env_number(ENV_VAR_SEARCH_LIMIT, DEFAULT_SEARCH_LIMIT)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a directory is empty or relative, the
    /// debounce is zero or above one minute, the undo window is zero, or a
    /// limit is zero.
    ///
    /// ```
    /// use pocket_journal::Config;
    /// use std::time::Duration;
    ///
    /// assert!(Config::for_dir("relative/path").validate().is_err());
    ///
    /// let mut config = Config::for_dir("/absolute/path");
    /// config.debounce = Duration::ZERO;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> AppResult<()> {
        check_dir("Entries directory", &self.entries_dir)?;
        if let Some(trash_dir) = &self.trash_dir {
            check_dir("Trash directory", trash_dir)?;
        }

        if self.debounce.is_zero() || self.debounce > Duration::from_millis(MAX_DEBOUNCE_MS) {
            return Err(AppError::Config(format!(
                "Autosave debounce must be between 1 and {} ms",
                MAX_DEBOUNCE_MS
            )));
        }
        if self.undo_window.is_zero() {
            return Err(AppError::Config(
                "Undo window must be at least one second".to_string(),
            ));
        }
        if self.recent_limit == 0 {
            return Err(AppError::Config(
                "Recent entries limit must be at least 1".to_string(),
            ));
        }
        if self.search_limit == 0 {
            return Err(AppError::Config(
                "Search result limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Store settings derived from this configuration.
    pub fn store_options(&self, clock: Arc<dyn Clock>) -> StoreOptions {
        let mut options = StoreOptions::new(&self.entries_dir)
            .undo_window(self.undo_window)
            .clock(clock);
        if let Some(trash_dir) = &self.trash_dir {
            options = options.trash_dir(trash_dir);
        }
        options
    }
}

fn expand_path(raw: &str) -> AppResult<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
    let path = PathBuf::from(expanded.into_owned());
    if path.as_os_str().is_empty() {
        return Err(AppError::Config("Directory path is empty".to_string()));
    }
    Ok(path)
}

fn check_dir(label: &str, dir: &Path) -> AppResult<()> {
    if dir.as_os_str().is_empty() {
        return Err(AppError::Config(format!("{} path is empty", label)));
    }
    if !dir.is_absolute() {
        return Err(AppError::Config(format!(
            "{} must be an absolute path",
            label
        )));
    }
    Ok(())
}

fn env_number<T: FromStr>(var: &str, default: T) -> AppResult<T> {
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            AppError::Config(format!("{} must be a whole number, got {:?}", var, raw))
        }),
        _ => Ok(default),
    }
}
