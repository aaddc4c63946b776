//! Command-line interface definition.

use crate::constants::{APP_DESCRIPTION, APP_NAME, LOG_FORMAT_JSON, LOG_FORMAT_TEXT};
use crate::journal::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A pocket journal with autosave, recent entries and fast search
#[derive(Parser, Debug)]
#[command(name = APP_NAME, about = APP_DESCRIPTION)]
#[command(author, version, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Print verbose output (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(
        long,
        global = true,
        default_value = LOG_FORMAT_TEXT,
        value_parser = [LOG_FORMAT_TEXT, LOG_FORMAT_JSON]
    )]
    pub log_format: String,

    /// Log filter, e.g. "debug" or "pocket_journal=trace". Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a new entry from --text or standard input
    Write {
        /// Entry text; read from stdin when omitted
        #[arg(short, long)]
        text: Option<String>,
    },

    /// List the most recently updated entries
    Recent {
        /// How many entries to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Search entries by title, tags and text
    Search {
        /// Words or phrase to look for
        query: String,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Print an entry's text
    Show {
        /// Entry id or unique id prefix
        id: String,
    },

    /// Delete an entry (restorable for a short while)
    Delete {
        /// Entry id or unique id prefix
        id: String,
    },

    /// Undo a recent deletion
    Restore {
        /// Id or unique id prefix of the deleted entry
        id: String,
    },

    /// Save a copy of an entry as a new entry
    Duplicate {
        /// Entry id or unique id prefix
        id: String,
    },

    /// Write an entry to a file outside the journal
    Export {
        /// Entry id or unique id prefix
        id: String,

        /// Destination file
        destination: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
    },

    /// Permanently remove entries with no text
    Cleanup,

    /// Rebuild the search index and report unreadable entries
    Reindex,
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        <CliArgs as Parser>::parse_from(std::env::args())
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == LOG_FORMAT_JSON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(CliArgs::try_parse_from(["pocket-journal"]).is_err());
    }

    #[test]
    fn test_write_command() {
        let args = parse(&["pocket-journal", "write", "--text", "Hello there"]);
        assert_eq!(
            args.command,
            Commands::Write {
                text: Some("Hello there".to_string())
            }
        );

        let args = parse(&["pocket-journal", "write"]);
        assert_eq!(args.command, Commands::Write { text: None });
    }

    #[test]
    fn test_search_with_limit() {
        let args = parse(&["pocket-journal", "search", "team meeting", "-n", "5"]);
        assert_eq!(
            args.command,
            Commands::Search {
                query: "team meeting".to_string(),
                limit: Some(5)
            }
        );
    }

    #[test]
    fn test_export_defaults_to_markdown() {
        let args = parse(&["pocket-journal", "export", "abc", "/tmp/out.md"]);
        match args.command {
            Commands::Export { id, destination, format } => {
                assert_eq!(id, "abc");
                assert_eq!(destination, PathBuf::from("/tmp/out.md"));
                assert_eq!(format, ExportFormat::Markdown);
            }
            other => panic!("Expected Export, got {:?}", other),
        }

        let args = parse(&["pocket-journal", "export", "abc", "out.txt", "--format", "text"]);
        assert!(matches!(
            args.command,
            Commands::Export {
                format: ExportFormat::Text,
                ..
            }
        ));
    }

    #[test]
    fn test_global_logging_flags() {
        let args = parse(&["pocket-journal", "recent"]);
        assert!(!args.verbose);
        assert!(!args.json_logs());
        assert_eq!(args.log_level, None);

        let args = parse(&[
            "pocket-journal",
            "recent",
            "-v",
            "--log-format",
            "json",
            "--log-level",
            "debug",
        ]);
        assert!(args.verbose);
        assert!(args.json_logs());
        assert_eq!(args.log_level.as_deref(), Some("debug"));

        assert!(CliArgs::try_parse_from(["pocket-journal", "recent", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse(&["pocket-journal", "cleanup"]).command, Commands::Cleanup);
        assert_eq!(parse(&["pocket-journal", "reindex"]).command, Commands::Reindex);
        assert_eq!(
            parse(&["pocket-journal", "restore", "6f1c"]).command,
            Commands::Restore {
                id: "6f1c".to_string()
            }
        );
    }
}
