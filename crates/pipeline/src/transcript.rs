//! Transcript accumulation
//!
//! The STT ingestion task appends finalized fragments continuously while the
//! turn loop reads-and-clears once per turn. The buffer is the only shared
//! resource with a producer/consumer hazard, so access goes through an
//! explicit lock-guarded hand-off; the lock is never held across an await.

use std::time::Instant;

use parking_lot::Mutex;

/// One complete candidate utterance handed to the turn loop
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Space-joined finalized fragments
    pub text: String,
    /// Wall-clock of the first fragment since the last clear, used to
    /// compute the candidate's response-latency gap
    pub first_fragment_at: Instant,
}

#[derive(Debug, Default)]
struct BufferState {
    text: String,
    first_fragment_at: Option<Instant>,
}

/// Accumulates finalized speech fragments until the turn-end signal
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    state: Mutex<BufferState>,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized fragment. Interim fragments must not be pushed.
    pub fn push_final(&self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        if state.first_fragment_at.is_none() {
            state.first_fragment_at = Some(Instant::now());
        }
        if !state.text.is_empty() {
            state.text.push(' ');
        }
        state.text.push_str(fragment);
    }

    /// Hand off the accumulated utterance and clear the buffer.
    ///
    /// Returns `None` when nothing has been accumulated; the caller should
    /// log and keep waiting rather than trigger an empty turn.
    pub fn take(&self) -> Option<Utterance> {
        let mut state = self.state.lock();
        if state.text.is_empty() {
            return None;
        }
        let text = std::mem::take(&mut state.text);
        let first_fragment_at = state.first_fragment_at.take()?;
        Some(Utterance {
            text,
            first_fragment_at,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_are_space_joined() {
        let buffer = TranscriptBuffer::new();
        buffer.push_final("I used tokio");
        buffer.push_final("in production");
        let utterance = buffer.take().unwrap();
        assert_eq!(utterance.text, "I used tokio in production");
    }

    #[test]
    fn test_take_clears_buffer() {
        let buffer = TranscriptBuffer::new();
        buffer.push_final("hello");
        assert!(buffer.take().is_some());
        assert!(buffer.take().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_empty_take_is_none() {
        let buffer = TranscriptBuffer::new();
        assert!(buffer.take().is_none());
    }

    #[test]
    fn test_blank_fragments_ignored() {
        let buffer = TranscriptBuffer::new();
        buffer.push_final("   ");
        buffer.push_final("");
        assert!(buffer.take().is_none());
    }

    #[test]
    fn test_first_fragment_timestamp_resets_on_take() {
        let buffer = TranscriptBuffer::new();
        buffer.push_final("one");
        let first = buffer.take().unwrap().first_fragment_at;
        buffer.push_final("two");
        let second = buffer.take().unwrap().first_fragment_at;
        assert!(second >= first);
    }
}
