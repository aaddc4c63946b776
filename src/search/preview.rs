use super::Query;
use crate::constants::{
    PREVIEW_BOUNDARY_SLACK, PREVIEW_ELLIPSIS, PREVIEW_LEADING_CHARS, PREVIEW_TRAILING_CHARS,
};
use std::ops::Range;

/// A short excerpt of an entry body around the best match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    /// Excerpt on a single line, with `...` where it was cut.
    pub text: String,
    /// Byte ranges into `text` covering query matches, sorted and disjoint.
    pub highlights: Vec<Range<usize>>,
}

impl Preview {
    /// Renders the excerpt with each highlight wrapped in `open`/`close`.
    ///
    /// ```
    /// use pocket_journal::search::Preview;
    ///
    /// let preview = Preview { text: "team meeting notes".into(), highlights: vec![5..12] };
    /// assert_eq!(preview.marked("[", "]"), "team [meeting] notes");
    /// ```
    pub fn marked(&self, open: &str, close: &str) -> String {
        let mut out = String::with_capacity(self.text.len() + self.highlights.len() * 4);
        let mut cursor = 0;
        for range in &self.highlights {
            out.push_str(&self.text[cursor..range.start]);
            out.push_str(open);
            out.push_str(&self.text[range.clone()]);
            out.push_str(close);
            cursor = range.end;
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

/// Cuts a preview out of `body`. `folded` is `body` after
/// [`fold`](super::fold); `more` says whether the entry continues past `body`.
pub(super) fn build(query: &Query, body: &str, folded: &str, more: bool) -> Preview {
    if body.is_empty() {
        return Preview::default();
    }

    let bounds: Vec<usize> = body
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(body.len()))
        .collect();
    let char_count = bounds.len() - 1;
    let char_at = |byte: usize| bounds.binary_search(&byte).unwrap_or_else(|i| i);
    let chars: Vec<char> = body.chars().collect();

    let (mut start, mut end, match_start, match_end) = match query.anchor(folded) {
        Some((pos, len)) => {
            let m_start = char_at(pos);
            let m_end = char_at(pos + len);
            (
                m_start.saturating_sub(PREVIEW_LEADING_CHARS),
                (m_start + PREVIEW_TRAILING_CHARS).min(char_count),
                m_start,
                m_end,
            )
        }
        None => {
            let end = (PREVIEW_LEADING_CHARS + PREVIEW_TRAILING_CHARS).min(char_count);
            (0, end, 0, 0)
        }
    };

    if start > 0 {
        let limit = (start + PREVIEW_BOUNDARY_SLACK).min(match_start);
        if let Some(ws) = (start..limit).find(|&i| chars[i].is_whitespace()) {
            start = ws + 1;
        }
    }
    if end < char_count {
        let floor = end.saturating_sub(PREVIEW_BOUNDARY_SLACK).max(match_end);
        if let Some(ws) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
            end = ws;
        }
    }

    let (from, to) = (bounds[start], bounds[end]);
    let excerpt: String = body[from..to]
        .chars()
        .map(|ch| if matches!(ch, '\n' | '\r' | '\t') { ' ' } else { ch })
        .collect();

    let lead = if start > 0 { PREVIEW_ELLIPSIS } else { "" };
    let tail = if end < char_count || more {
        PREVIEW_ELLIPSIS
    } else {
        ""
    };

    let mut ranges: Vec<Range<usize>> = query
        .occurrences(&folded[from..to])
        .into_iter()
        .map(|r| r.start + lead.len()..r.end + lead.len())
        .collect();
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut highlights: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match highlights.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => highlights.push(range),
        }
    }

    Preview {
        text: format!("{}{}{}", lead, excerpt, tail),
        highlights,
    }
}
