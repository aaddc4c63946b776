/*!
# Pocket Journal - command-line driver

Drives the journal library from the command line: each invocation opens the
journal, runs one command and exits.

## Usage

```text
pocket-journal [OPTIONS] <COMMAND>

Commands:
  write      Write a new entry from --text or standard input
  recent     List the most recently updated entries
  search     Search entries by title, tags and text
  show       Print an entry's text
  delete     Delete an entry (restorable for a short while)
  restore    Undo a recent deletion
  duplicate  Save a copy of an entry as a new entry
  export     Write an entry to a file outside the journal
  cleanup    Permanently remove entries with no text
  reindex    Rebuild the search index and report unreadable entries

Options:
  -v, --verbose                  Print verbose output (debug logging)
      --log-format <LOG_FORMAT>  Log output format [default: text] [possible values: text, json]
      --log-level <LOG_LEVEL>    Log filter, e.g. "debug" or "pocket_journal=trace"
```

## Configuration

- `POCKET_JOURNAL_DIR`: where entries live (defaults to `~/Documents/PocketJournal/Entries`)
- `POCKET_JOURNAL_TRASH_DIR`: holding area for deleted entries (defaults to `<dir>/.trash`)
- `POCKET_JOURNAL_DEBOUNCE_MS`, `POCKET_JOURNAL_UNDO_SECS`,
  `POCKET_JOURNAL_RECENT_LIMIT`, `POCKET_JOURNAL_SEARCH_LIMIT`
*/

use chrono::{DateTime, Local, Utc};
use pocket_journal::cli::{CliArgs, Commands};
use pocket_journal::config::Config;
use pocket_journal::constants::{
    DEFAULT_LOG_LEVEL, DISPLAY_TIMESTAMP_FORMAT, TRACING_ROOT_SPAN_NAME, TRACING_SERVICE_NAME,
};
use pocket_journal::entry::{id_prefix, EntryMetadata};
use pocket_journal::errors::AppResult;
use pocket_journal::journal::Journal;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, error, info, info_span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args);

    let correlation_id = Uuid::new_v4().to_string();
    let root_span = info_span!(
        TRACING_ROOT_SPAN_NAME,
        service_name = TRACING_SERVICE_NAME,
        correlation_id = %correlation_id,
    );
    let _guard = root_span.enter();
    debug!("CLI arguments: {:?}", args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(args: &CliArgs) {
    let env_filter = match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if args.verbose { "debug" } else { DEFAULT_LOG_LEVEL })
        }),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr);

    if args.json_logs() {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn run(args: CliArgs) -> AppResult<()> {
    let config = Config::load()?;
    let mut journal = Journal::open(config)?;
    info!("Opened journal");

    match args.command {
        Commands::Write { text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    if io::stdin().is_terminal() {
                        eprintln!("Type your entry, then press Ctrl-D to save.");
                    }
                    io::read_to_string(io::stdin())?
                }
            };

            let mut autosave = journal.autosave();
            autosave.edit(&text, Instant::now());
            match autosave.close(&mut journal)? {
                Some(entry) => println!(
                    "Saved {}  {}\n{}",
                    id_prefix(entry.id()),
                    entry.metadata.display_title(),
                    entry.metadata.path.display()
                ),
                None => println!("Nothing to save"),
            }
        }
        Commands::Recent { limit } => {
            let limit = limit.unwrap_or(journal.config().recent_limit);
            let recent = journal.recent(limit);
            if recent.is_empty() {
                println!("No entries yet");
            }
            for metadata in &recent {
                print_listing(metadata);
            }
        }
        Commands::Search { query, limit } => {
            let limit = limit.unwrap_or(journal.config().search_limit);
            let results = journal.search_with_limit(&query, limit);
            if results.is_empty() {
                println!("No entries match '{}'", query);
            }
            for result in &results {
                println!(
                    "{}  {}  {}  (score {})",
                    id_prefix(&result.id),
                    local_time(result.updated_at),
                    result.title,
                    result.score
                );
                if !result.preview.text.is_empty() {
                    println!("    {}", result.preview.marked("[", "]"));
                }
            }
        }
        Commands::Show { id } => {
            let id = journal.resolve_id(&id)?;
            let entry = journal.get(&id)?;
            println!("{}", entry.content);
        }
        Commands::Delete { id } => {
            let id = journal.resolve_id(&id)?;
            let tombstone = journal.delete(&id)?;
            println!(
                "Deleted {}  {}\nUndo with `pocket-journal restore {}` before {}",
                id_prefix(&tombstone.id),
                tombstone.title,
                id_prefix(&tombstone.id),
                tombstone.expires_at.with_timezone(&Local).format("%H:%M:%S")
            );
        }
        Commands::Restore { id } => {
            let id = journal.resolve_restore_id(&id)?;
            let entry = journal.restore(&id)?;
            println!(
                "Restored {}  {}\n{}",
                id_prefix(entry.id()),
                entry.metadata.display_title(),
                entry.metadata.path.display()
            );
        }
        Commands::Duplicate { id } => {
            let id = journal.resolve_id(&id)?;
            let copy = journal.duplicate(&id)?;
            println!(
                "Duplicated as {}\n{}",
                id_prefix(copy.id()),
                copy.metadata.path.display()
            );
        }
        Commands::Export {
            id,
            destination,
            format,
        } => {
            let id = journal.resolve_id(&id)?;
            journal.export(&id, &destination, format)?;
            println!("Exported {} as {} to {}", id_prefix(&id), format, destination.display());
        }
        Commands::Cleanup => {
            let removed = journal.cleanup_empty()?;
            match removed.len() {
                0 => println!("No empty entries"),
                n => println!("Removed {} empty entries", n),
            }
        }
        Commands::Reindex => {
            let count = journal.refresh();
            let warnings = journal.take_warnings();
            println!("Indexed {} entries", count);
            for warning in warnings {
                println!("Skipped: {}", warning);
            }
        }
    }

    Ok(())
}

fn print_listing(metadata: &EntryMetadata) {
    println!(
        "{}  {}  {}",
        id_prefix(&metadata.id),
        local_time(metadata.updated_at),
        metadata.display_title()
    );
}

fn local_time(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format(DISPLAY_TIMESTAMP_FORMAT)
        .to_string()
}
