/*!
# Pocket Journal

Pocket Journal is a small personal journal. Entries are plain markdown files
with a metadata header, saved automatically while you type, listed by recency
and found through a fast in-memory search index.

## Core Features

- Debounced autosave that never loses an edit on close
- Stable on-disk layout: `<root>/<YYYY>/<MM>/<timestamp>_<slug>.md`
- Recent-entries list kept in step with every save and deletion
- Ranked search over titles, tags and the start of each entry, with
  highlighted previews
- Soft delete with a short undo window
- Duplicate, export and cleanup of blank entries

## Architecture

- `entry`: Entry values and the rules for titles, word counts and slugs
- `store`: The file-backed entry store, its file format and the trash
- `autosave`: The per-entry save lifecycle
- `search`: The search index, ranking and previews
- `recency`: The recent-entries view
- `journal`: Ties the store and both views together behind one handle
- `config`, `cli`, `errors`, `clock`, `constants`: Supporting pieces

## Usage Example

```rust,no_run
use pocket_journal::{Config, Journal};

fn main() -> pocket_journal::AppResult<()> {
    let mut journal = Journal::open(Config::load()?)?;

    let entry = journal.create("Team meeting notes\nAgenda first.")?;
    for result in journal.search("meeting") {
        println!("{} {}", result.title, result.preview.marked("[", "]"));
    }

    journal.delete(entry.id())?;
    journal.restore(entry.id())?;
    Ok(())
}
```
*/

/// Per-entry autosave lifecycle
pub mod autosave;
/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Time sources
pub mod clock;
/// Configuration loading and management
pub mod config;
/// Application-wide constants
pub mod constants;
/// Entry values and derived fields
pub mod entry;
/// Error types and utilities for error handling
pub mod errors;
/// The journal handle
pub mod journal;
/// Recent-entries view
pub mod recency;
/// Search index and previews
pub mod search;
/// File-backed entry store
pub mod store;

// Re-export important types for convenience
pub use autosave::{Autosave, Persist, SaveEvent, SaveState};
pub use cli::CliArgs;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use entry::{Entry, EntryMetadata};
pub use errors::{AppError, AppResult, EntryError, LockError};
pub use journal::{ExportFormat, Journal};
pub use recency::RecencyView;
pub use search::{Preview, Query, QueryDebouncer, SearchIndex, SearchResult};
pub use store::{DeletionState, EntryStore, StoreOptions, Tombstone};
