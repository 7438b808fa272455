//! Deduplicating send-history stack with cursor-based recall.
//!
//! Re-sending a payload moves its existing entry to the end instead of
//! duplicating it, so recall always walks distinct payloads
//! most-recent-first.  The recall cursor lives in `[0, len]`: `0` means
//! "not recalling" (fresh input), `k > 0` means "showing the k-th most
//! recent distinct payload".  The draft that was on screen when recall
//! began is cached and restored when the cursor walks back to `0`.

use bytes::Bytes;

/// Move-to-end deduplication stack of previously sent payloads.
#[derive(Debug, Default)]
pub struct SendHistory {
    entries: Vec<Bytes>,
    cursor: usize,
    draft: Option<Bytes>,
}

impl SendHistory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            draft: None,
        }
    }

    /// Record a sent payload.
    ///
    /// An already-present payload is moved to the end rather than
    /// duplicated.  Resets the recall cursor and drops any cached draft.
    pub fn record(&mut self, payload: impl Into<Bytes>) {
        let payload = payload.into();
        self.entries.retain(|e| *e != payload);
        self.entries.push(payload);
        self.cursor = 0;
        self.draft = None;
    }

    /// Step the recall cursor one entry further into the past.
    ///
    /// The first step away from `0` caches `current_draft` so it can be
    /// restored later.  Returns the payload to display, or `None` when
    /// nothing changes (empty history, or the oldest entry was already
    /// reached).
    pub fn recall_previous(&mut self, current_draft: &[u8]) -> Option<Bytes> {
        if self.entries.is_empty() {
            return None;
        }
        if self.cursor == 0 {
            self.draft = Some(Bytes::copy_from_slice(current_draft));
        }
        if self.cursor < self.entries.len() {
            self.cursor += 1;
            Some(self.entries[self.entries.len() - self.cursor].clone())
        } else {
            None
        }
    }

    /// Step the recall cursor one entry back toward the present.
    ///
    /// Returns the payload to display; stepping back onto `0` yields the
    /// cached pre-recall draft (and clears the cache).  `None` when the
    /// cursor is already at `0`.
    pub fn recall_next(&mut self) -> Option<Bytes> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        if self.cursor == 0 {
            Some(self.draft.take().unwrap_or_default())
        } else {
            Some(self.entries[self.entries.len() - self.cursor].clone())
        }
    }

    /// Explicitly leave recall mode, e.g. when fresh input is submitted.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.draft = None;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest-first, for inspection.
    pub fn entries(&self) -> &[Bytes] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn test_record_dedup_moves_to_end() {
        let mut h = SendHistory::new();
        h.record(b("A"));
        h.record(b("B"));
        h.record(b("A"));
        assert_eq!(h.len(), 2);
        assert_eq!(h.entries(), &[b("B"), b("A")]);
    }

    #[test]
    fn test_record_same_payload_twice_keeps_one() {
        let mut h = SendHistory::new();
        h.record(b("X"));
        h.record(b("X"));
        assert_eq!(h.len(), 1);
        assert_eq!(h.entries(), &[b("X")]);
    }

    #[test]
    fn test_recall_walks_most_recent_first() {
        let mut h = SendHistory::new();
        h.record(b("A"));
        h.record(b("B"));
        h.record(b("C"));

        assert_eq!(h.recall_previous(b"draft"), Some(b("C")));
        assert_eq!(h.recall_previous(b"draft"), Some(b("B")));
        assert_eq!(h.recall_previous(b"draft"), Some(b("A")));
        // Oldest reached: further calls change nothing.
        assert_eq!(h.recall_previous(b"draft"), None);
        assert_eq!(h.cursor(), 3);
    }

    #[test]
    fn test_recall_next_reverses_and_restores_draft() {
        let mut h = SendHistory::new();
        h.record(b("A"));
        h.record(b("B"));
        h.record(b("C"));

        h.recall_previous(b"pending");
        h.recall_previous(b"pending");
        h.recall_previous(b"pending");

        assert_eq!(h.recall_next(), Some(b("B")));
        assert_eq!(h.recall_next(), Some(b("C")));
        assert_eq!(h.recall_next(), Some(b("pending")));
        assert_eq!(h.cursor(), 0);
        // Already back at fresh input: no-op.
        assert_eq!(h.recall_next(), None);
    }

    #[test]
    fn test_draft_cached_only_on_first_step() {
        let mut h = SendHistory::new();
        h.record(b("A"));
        h.record(b("B"));

        h.recall_previous(b"original");
        // Deeper steps must not overwrite the cached draft.
        h.recall_previous(b"should-be-ignored");
        h.recall_next();
        assert_eq!(h.recall_next(), Some(b("original")));
    }

    #[test]
    fn test_recall_empty_history_is_noop() {
        let mut h = SendHistory::new();
        assert_eq!(h.recall_previous(b"draft"), None);
        assert_eq!(h.cursor(), 0);
        assert_eq!(h.recall_next(), None);
    }

    #[test]
    fn test_record_resets_cursor_and_draft() {
        let mut h = SendHistory::new();
        h.record(b("A"));
        h.recall_previous(b"draft");
        assert_eq!(h.cursor(), 1);

        h.record(b("B"));
        assert_eq!(h.cursor(), 0);
        // Cached draft was dropped by record.
        assert_eq!(h.recall_next(), None);
    }

    #[test]
    fn test_recall_after_dedup_reorder() {
        let mut h = SendHistory::new();
        h.record(b("A"));
        h.record(b("B"));
        h.record(b("A"));

        assert_eq!(h.recall_previous(b""), Some(b("A")));
        assert_eq!(h.recall_previous(b""), Some(b("B")));
    }

    #[test]
    fn test_reset_cursor() {
        let mut h = SendHistory::new();
        h.record(b("A"));
        h.recall_previous(b"draft");
        h.reset_cursor();
        assert_eq!(h.cursor(), 0);
        assert_eq!(h.recall_next(), None);
    }
}
