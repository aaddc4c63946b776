//! In-memory full-text search over journal entries.
//!
//! Each entry is indexed as its title, tags and the first thousand
//! characters of its body, folded to lower case. Queries are scored by phrase
//! and word hits, and every result carries a short preview around the best
//! match with highlight spans.

mod preview;

pub use preview::Preview;

use crate::constants::{
    DEFAULT_QUERY_DEBOUNCE_MS, MIN_QUERY_WORD_CHARS, SCORE_PHRASE_MATCH, SCORE_TITLE_PHRASE_MATCH,
    SCORE_WORD_OCCURRENCE, SEARCH_CONTENT_PREFIX_CHARS,
};
use crate::entry::Entry;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub path: PathBuf,
    pub updated_at: DateTime<Utc>,
    pub score: u32,
    pub preview: Preview,
}

#[derive(Debug, Clone)]
struct Document {
    title: String,
    path: PathBuf,
    updated_at: DateTime<Utc>,
    folded_title: String,
    /// Title, tags and body prefix, folded.
    searchable: String,
    /// Body prefix as written; previews are cut from this.
    body: String,
    /// `body` folded; byte offsets line up with `body`.
    folded_body: String,
    /// The entry continues past `body`.
    truncated: bool,
}

impl Document {
    fn from_entry(entry: &Entry) -> Self {
        let body = prefix_chars(&entry.content, SEARCH_CONTENT_PREFIX_CHARS).to_string();
        let truncated = body.len() < entry.content.len();
        let folded_body = fold(&body);
        let folded_title = fold(&entry.metadata.title);

        let mut searchable = String::with_capacity(folded_title.len() + folded_body.len() + 32);
        searchable.push_str(&folded_title);
        for tag in &entry.metadata.tags {
            searchable.push('\n');
            searchable.push_str(&fold(tag));
        }
        searchable.push('\n');
        searchable.push_str(&folded_body);

        Self {
            title: entry.metadata.display_title().to_string(),
            path: entry.metadata.path.clone(),
            updated_at: entry.metadata.updated_at,
            folded_title,
            searchable,
            body,
            folded_body,
            truncated,
        }
    }
}

/// A parsed query: the whole phrase plus its significant words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    phrase: String,
    words: Vec<String>,
}

impl Query {
    /// Parses raw user input. Returns `None` when nothing searchable is left:
    /// blank input, or only one-character words.
    ///
    /// ```
    /// use pocket_journal::search::Query;
    ///
    /// let query = Query::parse("  Team, Meeting! ").unwrap();
    /// assert_eq!(query.phrase(), "team, meeting!");
    /// assert_eq!(query.words(), ["team", "meeting"]);
    /// assert!(Query::parse("a b ?").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let folded = fold(raw.trim());
        let words: Vec<String> = folded
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.chars().count() >= MIN_QUERY_WORD_CHARS)
            .map(str::to_string)
            .collect();
        if words.is_empty() {
            return None;
        }

        let phrase = folded.split_whitespace().collect::<Vec<_>>().join(" ");
        Some(Self { phrase, words })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    fn score(&self, doc: &Document) -> u32 {
        let mut score = 0;
        if doc.searchable.contains(&self.phrase) {
            score += SCORE_PHRASE_MATCH;
        }
        if doc.folded_title.contains(&self.phrase) {
            score += SCORE_TITLE_PHRASE_MATCH;
        }
        for word in &self.words {
            score += doc.searchable.matches(word.as_str()).count() as u32 * SCORE_WORD_OCCURRENCE;
        }
        score
    }

    /// Byte offset and length of the best match in `folded_body`: the phrase
    /// if it occurs, otherwise the earliest word.
    fn anchor(&self, folded_body: &str) -> Option<(usize, usize)> {
        if let Some(pos) = folded_body.find(&self.phrase) {
            return Some((pos, self.phrase.len()));
        }
        self.words
            .iter()
            .filter_map(|w| folded_body.find(w.as_str()).map(|pos| (pos, w.len())))
            .min()
    }

    /// Every phrase and word occurrence in `folded`, as byte ranges.
    fn occurrences(&self, folded: &str) -> Vec<std::ops::Range<usize>> {
        std::iter::once(&self.phrase)
            .chain(self.words.iter())
            .flat_map(|needle| {
                folded
                    .match_indices(needle.as_str())
                    .map(move |(pos, m)| pos..pos + m.len())
            })
            .collect()
    }
}

/// Relevance-ranked index of entries, keyed by id.
#[derive(Debug, Default)]
pub struct SearchIndex {
    docs: HashMap<String, Document>,
    generation: Option<u64>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.docs.contains_key(id)
    }

    /// Store generation this index reflects, if it has been built.
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// Records that the index now reflects store generation `generation`.
    pub fn mark_current(&mut self, generation: u64) {
        self.generation = Some(generation);
    }

    /// Marks the index as stale so the owner rebuilds it.
    pub fn invalidate(&mut self) {
        self.generation = None;
    }

    /// Replaces the whole index with `entries`.
    pub fn rebuild<I>(&mut self, entries: I, generation: u64)
    where
        I: IntoIterator<Item = Entry>,
    {
        self.docs = entries
            .into_iter()
            .map(|entry| (entry.id().to_string(), Document::from_entry(&entry)))
            .collect();
        self.generation = Some(generation);
        debug!("Rebuilt search index with {} entries", self.docs.len());
    }

    /// Adds or refreshes one entry.
    pub fn upsert(&mut self, entry: &Entry) {
        self.docs
            .insert(entry.id().to_string(), Document::from_entry(entry));
    }

    /// Drops one entry. Returns whether it was indexed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.docs.remove(id).is_some()
    }

    /// Runs `query` and returns at most `limit` results, best first.
    ///
    /// Blank queries, queries with no word of two or more characters, and
    /// queries that match nothing all return an empty list.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let Some(query) = Query::parse(query) else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        let mut hits: Vec<(&String, &Document, u32, usize)> = self
            .docs
            .iter()
            .filter_map(|(id, doc)| {
                let score = query.score(doc);
                if score == 0 {
                    return None;
                }
                let position = query
                    .anchor(&doc.folded_body)
                    .map_or(usize::MAX, |(pos, _)| pos);
                Some((id, doc, score, position))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.2.cmp(&a.2)
                .then_with(|| b.1.updated_at.cmp(&a.1.updated_at))
                .then_with(|| a.3.cmp(&b.3))
                .then_with(|| a.0.cmp(b.0))
        });
        hits.truncate(limit);

        debug!("Query {:?} matched {} entries", query.phrase(), hits.len());

        hits.into_iter()
            .map(|(id, doc, score, _)| SearchResult {
                id: id.clone(),
                title: doc.title.clone(),
                path: doc.path.clone(),
                updated_at: doc.updated_at,
                score,
                preview: preview::build(&query, &doc.body, &doc.folded_body, doc.truncated),
            })
            .collect()
    }
}

/// Lower-cases `text` without changing any character's byte length, so
/// offsets into the folded text are valid in the original.
///
/// ```
/// use pocket_journal::search::fold;
///
/// assert_eq!(fold("Team MEETING"), "team meeting");
/// assert_eq!(fold("İstanbul").len(), "İstanbul".len());
/// ```
pub fn fold(text: &str) -> String {
    text.chars()
        .map(|ch| {
            let mut lower = ch.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) if l.len_utf8() == ch.len_utf8() => l,
                _ => ch,
            }
        })
        .collect()
}

fn prefix_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Holds back keystroke-driven queries until typing pauses.
///
/// A newer query replaces a pending one, so only the last query of a burst
/// is ever run.
#[derive(Debug, Clone)]
pub struct QueryDebouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Default for QueryDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_QUERY_DEBOUNCE_MS))
    }
}

impl QueryDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn submit(&mut self, query: impl Into<String>, now: Instant) {
        self.pending = Some((query.into(), now + self.delay));
    }

    /// Returns the pending query once its delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(query, _)| query),
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
