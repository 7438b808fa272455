//! Append-only transcript of exchanged frames.
//!
//! Insertion order is chronological order; frames are never reordered or
//! mutated after append.  The whole log can be re-iterated at any time,
//! which is how a display-mode toggle re-renders history under the new
//! codec.

use crate::terminal::types::Frame;

/// Ordered, append-only record of every exchanged frame.
#[derive(Debug, Default)]
pub struct TranscriptLog {
    frames: Vec<Frame>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Append a frame. O(1), never fails.
    pub fn append(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Iterate all frames in chronological order.  Restartable: call as
    /// often as needed for full replays.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Drop all frames.  Only driven by explicit external action.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The most recently appended frame, if any.
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::types::Direction;

    fn frame(direction: Direction, payload: &[u8], elapsed_ms: u64) -> Frame {
        Frame::new(direction, payload.to_vec(), elapsed_ms)
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = TranscriptLog::new();
        log.append(frame(Direction::Tx, b"one", 0));
        log.append(frame(Direction::Rx, b"two", 5));
        log.append(frame(Direction::Tx, b"three", 9));

        let directions: Vec<_> = log.iter().map(|f| f.direction).collect();
        assert_eq!(
            directions,
            vec![Direction::Tx, Direction::Rx, Direction::Tx]
        );
        assert_eq!(log.len(), 3);
        assert_eq!(&log.last().unwrap().payload[..], b"three");
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut log = TranscriptLog::new();
        log.append(frame(Direction::Tx, b"x", 0));
        log.append(frame(Direction::Rx, b"y", 1));

        let first: Vec<_> = log.iter().collect();
        let second: Vec<_> = log.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut log = TranscriptLog::new();
        log.append(frame(Direction::Rx, b"data", 3));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.iter().count(), 0);
    }
}
