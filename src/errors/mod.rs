//! Error handling utilities for the pocket-journal application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.
//!
//! Storage and index failures are always reported as values. A corrupt file, a
//! failed save or an expired undo window never terminates the process.

use chrono::{DateTime, Utc};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents conditions specific to individual journal entries.
///
/// # Examples
///
/// Reporting a corrupt entry file:
///
/// ```
/// use pocket_journal::errors::EntryError;
/// use std::path::PathBuf;
///
/// let error = EntryError::Corrupt {
///     path: PathBuf::from("/entries/2024/01/2024-01-15_14-30-00_notes.md"),
///     reason: "missing front-matter header".to_string(),
/// };
///
/// assert!(format!("{}", error).contains("Corrupt entry"));
/// assert!(format!("{}", error).contains("missing front-matter header"));
/// ```
///
/// Reporting an expired undo window:
///
/// ```
/// use pocket_journal::errors::EntryError;
/// use chrono::{TimeZone, Utc};
///
/// let error = EntryError::DeletionExpired {
///     id: "6f1c2a9e".to_string(),
///     expired_at: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 10).unwrap(),
/// };
///
/// assert!(format!("{}", error).contains("can no longer be undone"));
/// ```
#[derive(Debug, Error)]
pub enum EntryError {
    /// The file exists but its header is missing, malformed or inconsistent.
    /// The file itself is left untouched for manual recovery.
    #[error("Corrupt entry at {path}: {reason}. The file has been left untouched for manual recovery.")]
    Corrupt {
        /// Location of the offending file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// No active entry carries the requested id.
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// A restore was attempted after the undo window closed.
    #[error("Deletion of entry {id} can no longer be undone; the undo window closed at {expired_at}.")]
    DeletionExpired {
        /// Id of the deleted entry
        id: String,
        /// Instant at which the undo window closed
        expired_at: DateTime<Utc>,
    },
}

/// Represents errors that can occur when locking the entries directory.
///
/// # Examples
///
/// ```
/// use pocket_journal::errors::LockError;
/// use std::path::PathBuf;
///
/// let error = LockError::StoreBusy {
///     path: PathBuf::from("/entries/.pocket-journal.lock"),
/// };
///
/// assert!(format!("{}", error).contains("already open"));
/// ```
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the store lock.
    #[error("The journal at {path} is already open in another pocket-journal process. Close it and try again.")]
    StoreBusy {
        /// The path to the lock file
        path: PathBuf,
    },

    /// Error when acquiring the lock fails for a technical reason.
    #[error("Failed to acquire lock {path}: {source}. Please check file permissions and ensure the directory is accessible.")]
    AcquisitionFailed {
        /// The path to the lock file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Represents all possible errors that can occur in the pocket-journal application.
///
/// This enum is the central error type used across the application, with variants
/// for different error categories. It uses `thiserror` for deriving the `Error` trait
/// implementation and formatted error messages.
///
/// # Examples
///
/// Creating a configuration error:
/// ```
/// use pocket_journal::errors::AppError;
///
/// let error = AppError::Config("Missing entries directory".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Missing entries directory");
/// ```
///
/// Converting from an IO error:
/// ```
/// use pocket_journal::errors::AppError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "file not found");
/// let app_error: AppError = io_error.into();
///
/// match app_error {
///     AppError::Io(inner) => assert_eq!(inner.kind(), ErrorKind::NotFound),
///     _ => panic!("Expected Io variant"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Entry-level conditions (corrupt file, unknown id, expired undo window).
    #[error("Entry error: {0}")]
    Entry(#[from] EntryError),

    /// Errors related to locking the entries directory.
    #[error("File locking error: {0}")]
    Lock(#[from] LockError),

    /// Header or tombstone (de)serialization failures.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An autosave could not be committed. The in-memory content is kept and
    /// the save is retried on the next trigger.
    #[error("Entry {id} was not saved: {source}")]
    SaveFailed {
        /// Id of the entry that is still unsaved
        id: String,
        /// Why the write failed
        #[source]
        source: Box<AppError>,
    },

    /// Errors in journal operations that don't fit elsewhere.
    #[error("Journal error: {0}")]
    Journal(String),
}

impl AppError {
    /// Returns true for the corrupt-entry condition, however it was wrapped.
    pub fn is_corrupt_entry(&self) -> bool {
        matches!(self, AppError::Entry(EntryError::Corrupt { .. }))
    }

    /// Returns true when a restore was declined because the window closed.
    pub fn is_deletion_expired(&self) -> bool {
        matches!(self, AppError::Entry(EntryError::DeletionExpired { .. }))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
///
/// # Examples
///
/// ```
/// use pocket_journal::errors::{AppResult, AppError};
///
/// fn might_fail() -> AppResult<String> {
///     if false {
///         return Err(AppError::Journal("Something went wrong".to_string()));
///     }
///     Ok("Operation succeeded".to_string())
/// }
/// ```
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::error::Error as StdError;

    #[test]
    fn test_app_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");

        let app_error: AppError = io_error.into();

        match app_error {
            AppError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("Expected AppError::Io variant"),
        }
    }

    #[test]
    fn test_app_error_display() {
        let config_error = AppError::Config("Invalid configuration".to_string());
        assert_eq!(
            format!("{}", config_error),
            "Configuration error: Invalid configuration"
        );

        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let app_io_error = AppError::Io(io_error);
        assert_eq!(format!("{}", app_io_error), "I/O error: permission denied");

        let journal_error = AppError::Journal("Unknown export format".to_string());
        assert_eq!(
            format!("{}", journal_error),
            "Journal error: Unknown export format"
        );

        let lock_error = LockError::StoreBusy {
            path: PathBuf::from("/entries/.pocket-journal.lock"),
        };
        let app_error = AppError::Lock(lock_error);
        assert!(format!("{}", app_error).contains("File locking error"));
        assert!(format!("{}", app_error).contains("/entries/.pocket-journal.lock"));
    }

    #[test]
    fn test_entry_error_variants() {
        let error = EntryError::Corrupt {
            path: PathBuf::from("/entries/bad.md"),
            reason: "missing front-matter header".to_string(),
        };
        assert!(format!("{}", error).contains("/entries/bad.md"));
        assert!(format!("{}", error).contains("left untouched"));

        let error = EntryError::NotFound("abc".to_string());
        assert_eq!(format!("{}", error), "Entry not found: abc");

        let expired_at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 10).unwrap();
        let error = EntryError::DeletionExpired {
            id: "abc".to_string(),
            expired_at,
        };
        assert!(format!("{}", error).contains("abc"));
        assert!(format!("{}", error).contains("2024-01-15"));
    }

    #[test]
    fn test_condition_predicates() {
        let corrupt: AppError = EntryError::Corrupt {
            path: PathBuf::from("x.md"),
            reason: "garbled".to_string(),
        }
        .into();
        assert!(corrupt.is_corrupt_entry());
        assert!(!corrupt.is_deletion_expired());

        let expired: AppError = EntryError::DeletionExpired {
            id: "abc".to_string(),
            expired_at: Utc::now(),
        }
        .into();
        assert!(expired.is_deletion_expired());
        assert!(!expired.is_corrupt_entry());
    }

    #[test]
    fn test_save_failed_source_chaining() {
        let io_error = io::Error::other("disk full");
        let error = AppError::SaveFailed {
            id: "abc".to_string(),
            source: Box::new(AppError::Io(io_error)),
        };

        assert!(format!("{}", error).contains("abc"));
        assert!(format!("{}", error).contains("disk full"));

        let source = error.source().expect("SaveFailed should expose its source");
        assert!(source.to_string().contains("I/O error"));
    }

    #[test]
    fn test_lock_error_source_chaining() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let error = LockError::AcquisitionFailed {
            path: PathBuf::from("/entries/.pocket-journal.lock"),
            source: io_error,
        };
        assert!(format!("{}", error).contains("Failed to acquire lock"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_serialization_conversions() {
        let yaml_err = serde_yaml::from_str::<u32>("not: [a number").unwrap_err();
        let app_error: AppError = yaml_err.into();
        assert!(matches!(app_error, AppError::Serialization(_)));

        let json_err = serde_json::from_str::<u32>("{").unwrap_err();
        let app_error: AppError = json_err.into();
        assert!(format!("{}", app_error).starts_with("Serialization error"));
    }

    #[test]
    fn test_result_combinators() {
        let io_result: Result<(), io::Error> = Err(io::Error::other("test error"));
        let app_result: AppResult<()> = io_result.map_err(AppError::Io);

        assert!(app_result.is_err());
        if let Err(AppError::Io(e)) = app_result {
            assert_eq!(e.to_string(), "test error");
        }
    }
}
