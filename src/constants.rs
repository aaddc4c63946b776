//! Constants used throughout the application.
//!
//! This module contains all constants used in the pocket-journal application,
//! organized into logical groups. Having constants centralized makes them easier
//! to find, modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "pocket-journal";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A pocket journal with autosave, recent entries and fast search";

// CLI Arguments & Defaults
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level when neither --log-level nor RUST_LOG is set.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

// Configuration Keys & Environment Variables
/// Environment variable for the directory holding journal entries.
pub const ENV_VAR_ENTRIES_DIR: &str = "POCKET_JOURNAL_DIR";
/// Environment variable for the soft-delete holding area.
pub const ENV_VAR_TRASH_DIR: &str = "POCKET_JOURNAL_TRASH_DIR";
/// Environment variable for the autosave debounce interval in milliseconds.
pub const ENV_VAR_DEBOUNCE_MS: &str = "POCKET_JOURNAL_DEBOUNCE_MS";
/// Environment variable for the delete undo window in seconds.
pub const ENV_VAR_UNDO_SECS: &str = "POCKET_JOURNAL_UNDO_SECS";
/// Environment variable for the number of recent entries kept ready.
pub const ENV_VAR_RECENT_LIMIT: &str = "POCKET_JOURNAL_RECENT_LIMIT";
/// Environment variable for the maximum number of search results.
pub const ENV_VAR_SEARCH_LIMIT: &str = "POCKET_JOURNAL_SEARCH_LIMIT";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Default sub-directory for entries within the user's home directory.
pub const DEFAULT_ENTRIES_SUBDIR: &str = "Documents/PocketJournal/Entries";
/// Name of the soft-delete holding area inside the entries directory.
pub const DEFAULT_TRASH_DIR_NAME: &str = ".trash";
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

// Autosave
/// Default debounce interval between the last edit and the autosave.
pub const DEFAULT_DEBOUNCE_MS: u64 = 900;
/// Upper bound accepted for the debounce interval.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

// Soft delete
/// Default window during which a deleted entry can be restored.
pub const DEFAULT_UNDO_WINDOW_SECS: u64 = 10;
/// File inside the holding area that records pending deletions.
pub const TOMBSTONE_FILE_NAME: &str = "tombstones.json";

// Recency
/// Default number of entries kept in the recency view.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

// Search
/// Default maximum number of search results returned.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
/// Number of content characters considered by the search index.
pub const SEARCH_CONTENT_PREFIX_CHARS: usize = 1000;
/// Score for the query phrase occurring anywhere in the searchable text.
pub const SCORE_PHRASE_MATCH: u32 = 100;
/// Additional score for the query phrase occurring in the title.
pub const SCORE_TITLE_PHRASE_MATCH: u32 = 50;
/// Score for each occurrence of an individual query word.
pub const SCORE_WORD_OCCURRENCE: u32 = 10;
/// Query words shorter than this many characters are ignored.
pub const MIN_QUERY_WORD_CHARS: usize = 2;
/// Characters of context kept before the match in a preview.
pub const PREVIEW_LEADING_CHARS: usize = 50;
/// Characters of context kept from the match onward in a preview.
pub const PREVIEW_TRAILING_CHARS: usize = 100;
/// How far a preview edge may move to land on a word boundary.
pub const PREVIEW_BOUNDARY_SLACK: usize = 20;
/// Marker added where a preview has been cut.
pub const PREVIEW_ELLIPSIS: &str = "...";
/// Default quiet period before a typed query is executed.
pub const DEFAULT_QUERY_DEBOUNCE_MS: u64 = 300;

// File System Parameters
/// File extension for journal entries.
pub const ENTRY_FILE_EXTENSION: &str = "md";
/// Name of the lock file guarding the entries directory.
pub const LOCK_FILE_NAME: &str = ".pocket-journal.lock";
/// Front-matter delimiter line.
pub const HEADER_DELIMITER: &str = "---";
/// Maximum length of the title slug used in filenames.
pub const MAX_SLUG_CHARS: usize = 50;
/// Number of id characters used when the slug is empty or taken.
pub const ID_SLUG_CHARS: usize = 8;
/// Maximum length of a derived title.
pub const MAX_TITLE_CHARS: usize = 100;
/// Maximum length of a derived subtitle.
pub const MAX_SUBTITLE_CHARS: usize = 150;
/// Default POSIX permissions for newly created directories (owner read/write/execute).
#[cfg(unix)]
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o700;
/// Default POSIX permissions for newly created files (owner read/write).
#[cfg(unix)]
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o600;

// Date/Time Logic
/// Timestamp prefix of entry filenames.
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
/// Year directory format.
pub const YEAR_DIR_FORMAT: &str = "%Y";
/// Month directory format.
pub const MONTH_DIR_FORMAT: &str = "%m";
/// Human-readable timestamp used by the command-line listing.
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

// Logging Configuration
/// Service name used in tracing spans and structured logs.
pub const TRACING_SERVICE_NAME: &str = "pocket-journal";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";
