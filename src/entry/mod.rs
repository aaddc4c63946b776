//! Journal entry value objects.
//!
//! An [`Entry`] owns its raw `content` and an [`EntryMetadata`] header. The
//! content is the single source of truth: title, subtitle and word count are
//! always recomputable from it with [`Entry::refresh_derived`].

use crate::constants::{ID_SLUG_CHARS, MAX_SLUG_CHARS, MAX_SUBTITLE_CHARS, MAX_TITLE_CHARS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use uuid::Uuid;

/// Metadata header stored at the top of every entry file.
///
/// Field names and order are part of the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Opaque unique identifier, assigned at creation.
    pub id: String,
    /// Set once when the entry is created.
    pub created_at: DateTime<Utc>,
    /// Moved forward every time the entry is committed to disk.
    pub updated_at: DateTime<Utc>,
    /// Derived from the first line or sentence of the content.
    pub title: String,
    /// Derived from the text following the title.
    pub subtitle: String,
    /// User- or rule-assigned tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Number of whitespace-separated words, recomputed on save.
    pub word_count: usize,
    /// Storage location, owned by the store.
    #[serde(default)]
    pub path: PathBuf,
}

impl EntryMetadata {
    /// Fresh metadata for an entry created at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            title: String::new(),
            subtitle: String::new(),
            tags: BTreeSet::new(),
            word_count: 0,
            path: PathBuf::new(),
        }
    }

    /// Title for display, falling back to "Untitled".
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    /// Whether the entry has been written to disk at least once.
    pub fn is_persisted(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }
}

/// One journal entry: metadata plus the user's unmodified text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub metadata: EntryMetadata,
    pub content: String,
}

impl Entry {
    /// Creates an entry at `now` holding `content`.
    ///
    /// ```
    /// use pocket_journal::entry::Entry;
    /// use chrono::Utc;
    ///
    /// let entry = Entry::new(Utc::now(), "# Team meeting notes\nAgenda first.");
    /// assert_eq!(entry.metadata.created_at, entry.metadata.updated_at);
    /// assert!(entry.metadata.title.is_empty()); // derived on save
    /// ```
    pub fn new(now: DateTime<Utc>, content: impl Into<String>) -> Self {
        Self {
            metadata: EntryMetadata::new(now),
            content: content.into(),
        }
    }

    /// Rebuilds an entry from a parsed header and body.
    pub fn from_parts(metadata: EntryMetadata, content: String) -> Self {
        Self { metadata, content }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Replaces the content. Derived fields are left alone until the next
    /// [`refresh_derived`](Self::refresh_derived).
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Recomputes title, subtitle and word count from the content.
    pub fn refresh_derived(&mut self) {
        let (title, subtitle) = derive_title_and_subtitle(&self.content);
        self.metadata.title = title;
        self.metadata.subtitle = subtitle;
        self.metadata.word_count = count_words(&self.content);
    }

    /// Moves `updated_at` to `now` without ever going backwards or before
    /// `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.metadata.updated_at.max(self.metadata.created_at);
        self.metadata.updated_at = now.max(floor);
    }

    /// True when the content holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Counts whitespace-separated words.
///
/// ```
/// assert_eq!(pocket_journal::entry::count_words("  one two\nthree "), 3);
/// assert_eq!(pocket_journal::entry::count_words("   "), 0);
/// ```
pub fn count_words(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Derives `(title, subtitle)` from entry content.
///
/// The title is the first non-blank line with heading markers removed. A plain
/// (non-heading) line is cut after its first sentence, and the rest of that
/// line becomes the subtitle; otherwise the subtitle is the next non-blank
/// line.
///
/// ```
/// use pocket_journal::entry::derive_title_and_subtitle;
///
/// let (title, subtitle) = derive_title_and_subtitle("# Team meeting notes\n\nAgenda first.");
/// assert_eq!(title, "Team meeting notes");
/// assert_eq!(subtitle, "Agenda first.");
///
/// let (title, subtitle) = derive_title_and_subtitle("Slept well. Long walk after.");
/// assert_eq!(title, "Slept well.");
/// assert_eq!(subtitle, "Long walk after.");
/// ```
pub fn derive_title_and_subtitle(content: &str) -> (String, String) {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let Some(first) = lines.next() else {
        return (String::new(), String::new());
    };

    let is_heading = first.starts_with('#');
    let first = strip_heading(first);

    let (title, rest) = if is_heading {
        (first, "")
    } else {
        split_first_sentence(first)
    };

    let subtitle = if rest.is_empty() {
        lines
            .next()
            .map(|line| split_first_sentence(strip_heading(line)).0)
            .unwrap_or("")
    } else {
        split_first_sentence(rest).0
    };

    (
        truncate_chars(title, MAX_TITLE_CHARS),
        truncate_chars(subtitle, MAX_SUBTITLE_CHARS),
    )
}

fn strip_heading(line: &str) -> &str {
    line.trim_start_matches('#').trim()
}

/// Splits after the first `.`, `!` or `?` that is followed by whitespace.
fn split_first_sentence(text: &str) -> (&str, &str) {
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?') {
            if let Some(&(next_idx, next)) = chars.peek() {
                if next.is_whitespace() {
                    return (text[..idx + ch.len_utf8()].trim(), text[next_idx..].trim());
                }
            }
        }
    }
    (text.trim(), "")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Filesystem-safe slug: lower-case ASCII alphanumerics joined by single
/// hyphens, at most 50 characters. Returns an empty string when nothing
/// usable remains.
///
/// ```
/// use pocket_journal::entry::slugify;
///
/// assert_eq!(slugify("Team meeting notes!"), "team-meeting-notes");
/// assert_eq!(slugify("  ***  "), "");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(MAX_SLUG_CHARS));
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                if slug.len() + 1 >= MAX_SLUG_CHARS {
                    break;
                }
                slug.push('-');
            }
            pending_hyphen = false;
            if slug.len() >= MAX_SLUG_CHARS {
                break;
            }
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Slug used in an entry's filename: the title slug, or the id prefix when
/// the title yields nothing.
pub fn file_slug(metadata: &EntryMetadata) -> String {
    let slug = slugify(&metadata.title);
    if slug.is_empty() {
        id_prefix(&metadata.id).to_string()
    } else {
        slug
    }
}

/// First characters of an id, used to disambiguate filenames.
pub fn id_prefix(id: &str) -> &str {
    match id.char_indices().nth(ID_SLUG_CHARS) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_new_entry_has_unique_ids() {
        let a = Entry::new(fixed_now(), "");
        let b = Entry::new(fixed_now(), "");
        assert_ne!(a.id(), b.id());
        assert!(!a.metadata.is_persisted());
    }

    #[test]
    fn test_refresh_derived_from_heading() {
        let mut entry = Entry::new(fixed_now(), "## Team meeting notes\n\nWe agreed on the plan.\n");
        entry.refresh_derived();
        assert_eq!(entry.metadata.title, "Team meeting notes");
        assert_eq!(entry.metadata.subtitle, "We agreed on the plan.");
        assert_eq!(entry.metadata.word_count, 9);
    }

    #[test]
    fn test_refresh_derived_does_not_touch_content() {
        let raw = "  # Heading with *stars*  \n\n- a list\n";
        let mut entry = Entry::new(fixed_now(), raw);
        entry.refresh_derived();
        assert_eq!(entry.content, raw);
    }

    #[test]
    fn test_blank_content_has_empty_derived_fields() {
        let mut entry = Entry::new(fixed_now(), " \n\t\n");
        entry.refresh_derived();
        assert!(entry.metadata.title.is_empty());
        assert!(entry.metadata.subtitle.is_empty());
        assert_eq!(entry.metadata.word_count, 0);
        assert!(entry.is_blank());
        assert_eq!(entry.metadata.display_title(), "Untitled");
    }

    #[test]
    fn test_title_is_truncated() {
        let long_line = "word ".repeat(60);
        let (title, _) = derive_title_and_subtitle(&long_line);
        assert!(title.chars().count() <= MAX_TITLE_CHARS);
        assert!(!title.ends_with(' '));
    }

    #[test]
    fn test_sentence_split_ignores_decimal_points() {
        let (title, subtitle) = derive_title_and_subtitle("Ran 5.5 km today");
        assert_eq!(title, "Ran 5.5 km today");
        assert!(subtitle.is_empty());
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut entry = Entry::new(fixed_now(), "text");
        entry.touch(fixed_now() + Duration::seconds(10));
        assert_eq!(entry.metadata.updated_at, fixed_now() + Duration::seconds(10));

        // A clock that jumped backwards must not move updated_at back.
        entry.touch(fixed_now() - Duration::seconds(30));
        assert_eq!(entry.metadata.updated_at, fixed_now() + Duration::seconds(10));
        assert!(entry.metadata.updated_at >= entry.metadata.created_at);
    }

    #[test]
    fn test_slugify_rules() {
        assert_eq!(slugify("Hello,   World"), "hello-world");
        assert_eq!(slugify("--leading and trailing--"), "leading-and-trailing");
        assert_eq!(slugify("Café résumé"), "caf-r-sum");
        let long = slugify(&"abcdefghij ".repeat(10));
        assert!(long.len() <= MAX_SLUG_CHARS);
        assert!(!long.ends_with('-'));
    }

    #[test]
    fn test_file_slug_falls_back_to_id() {
        let mut entry = Entry::new(fixed_now(), "!!!");
        entry.refresh_derived();
        let slug = file_slug(&entry.metadata);
        assert_eq!(slug, id_prefix(entry.id()));
        assert_eq!(slug.len(), ID_SLUG_CHARS);
    }
}
