//! Most-recently-updated entries, kept ready for the launcher list.

use crate::constants::DEFAULT_RECENT_LIMIT;
use crate::entry::EntryMetadata;
use std::cmp::Ordering;
use tracing::debug;

/// The `capacity` most recently updated entries, newest first.
///
/// Ties on `updated_at` are broken by id so the order is stable.
#[derive(Debug, Clone)]
pub struct RecencyView {
    capacity: usize,
    items: Vec<EntryMetadata>,
    needs_refill: bool,
    generation: Option<u64>,
}

impl Default for RecencyView {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_LIMIT)
    }
}

impl RecencyView {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity + 1),
            needs_refill: false,
            generation: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when a removal may have left out an entry that belongs in view.
    pub fn needs_refill(&self) -> bool {
        self.needs_refill
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn mark_current(&mut self, generation: u64) {
        self.generation = Some(generation);
    }

    pub fn invalidate(&mut self) {
        self.generation = None;
    }

    /// Places a just-saved entry at its position, replacing any older copy.
    pub fn record(&mut self, metadata: &EntryMetadata) {
        self.items.retain(|m| m.id != metadata.id);
        let pos = self
            .items
            .binary_search_by(|other| newest_first(other, metadata))
            .unwrap_or_else(|i| i);
        if pos < self.capacity {
            self.items.insert(pos, metadata.clone());
            self.items.truncate(self.capacity);
        }
    }

    /// Drops an entry, e.g. right after it was deleted.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|m| m.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.needs_refill = true;
            debug!("Removed {} from recent entries; refill pending", id);
        }
        removed
    }

    /// Recomputes the view from every entry's metadata.
    pub fn rebuild<I>(&mut self, all: I, generation: u64)
    where
        I: IntoIterator<Item = EntryMetadata>,
    {
        let mut items: Vec<EntryMetadata> = all.into_iter().collect();
        items.sort_by(newest_first);
        items.truncate(self.capacity);

        self.items = items;
        self.needs_refill = false;
        self.generation = Some(generation);
    }

    /// The first `k` entries (fewer if the view holds fewer).
    pub fn top(&self, k: usize) -> &[EntryMetadata] {
        &self.items[..k.min(self.items.len())]
    }
}

/// Orders metadata newest first, then by id.
pub fn newest_first(a: &EntryMetadata, b: &EntryMetadata) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| a.id.cmp(&b.id))
}
