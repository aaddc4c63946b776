//! Entry file encoding: YAML front matter, a blank line, then the raw body.

use crate::constants::HEADER_DELIMITER;
use crate::entry::{Entry, EntryMetadata};
use crate::errors::{AppResult, EntryError};
use std::path::Path;

/// Renders an entry in its on-disk form.
pub(crate) fn render(entry: &Entry) -> AppResult<String> {
    let header = serde_yaml::to_string(&entry.metadata)?;
    Ok(format!(
        "{delim}\n{header}{delim}\n\n{body}",
        delim = HEADER_DELIMITER,
        header = header,
        body = entry.content
    ))
}

/// Splits and parses an entry file. The returned metadata carries `path` as
/// its location regardless of what the header says.
pub(crate) fn parse<'a>(
    path: &Path,
    text: &'a str,
) -> Result<(EntryMetadata, &'a str), EntryError> {
    let corrupt = |reason: String| EntryError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let (header, body) =
        split_front_matter(text).ok_or_else(|| corrupt("missing front-matter header".to_string()))?;

    let mut metadata: EntryMetadata = serde_yaml::from_str(header)
        .map_err(|e| corrupt(format!("malformed front-matter header: {}", e)))?;

    if metadata.id.trim().is_empty() {
        return Err(corrupt("header has an empty id".to_string()));
    }
    if metadata.updated_at < metadata.created_at {
        return Err(corrupt(format!(
            "updated_at {} precedes created_at {}",
            metadata.updated_at, metadata.created_at
        )));
    }

    metadata.path = path.to_path_buf();
    Ok((metadata, body))
}

/// Returns `(header, body)` for text of the form `---\n<header>---\n\n<body>`.
/// Exactly one blank line after the closing delimiter is consumed so the body
/// round-trips byte for byte.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;

    let closing = "\n---\n";
    let (header, after) = if let Some(idx) = rest.find(closing) {
        (&rest[..idx + 1], &rest[idx + closing.len()..])
    } else if let Some(header) = rest.strip_suffix("\n---") {
        (header, "")
    } else {
        return None;
    };

    let body = after
        .strip_prefix('\n')
        .or_else(|| after.strip_prefix("\r\n"))
        .unwrap_or(after);
    Some((header, body))
}
