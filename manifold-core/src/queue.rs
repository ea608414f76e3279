//! The outgoing part queue.
//!
//! An ordered sequence of pending message parts owned exclusively by one
//! socket wrapper. `send` appends whole multi-part groups atomically at the
//! tail; the dispatch engine pops from the front. Parts belonging to one
//! group are never interleaved with parts of another.

use bytes::Bytes;
use std::collections::VecDeque;
use std::fmt;

/// One queued message part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedPart {
    /// Part payload
    pub payload: Bytes,
    /// More parts of the same group follow this one
    pub more: bool,
}

/// Diagnostic view of a queued part, attached to error events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSnapshot {
    /// Payload length in bytes
    pub len: usize,
    /// MORE flag of the part
    pub more: bool,
}

impl fmt::Display for PartSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.more {
            write!(f, "{}+more", self.len)
        } else {
            write!(f, "{}", self.len)
        }
    }
}

/// FIFO queue of not-yet-transmitted message parts.
#[derive(Debug, Default)]
pub struct OutgoingQueue {
    parts: VecDeque<QueuedPart>,
}

impl OutgoingQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a whole multi-part group at the tail.
    ///
    /// The MORE flag is set on every part except the last one of the group.
    /// An empty group appends nothing.
    pub fn push_group<I>(&mut self, parts: I)
    where
        I: IntoIterator<Item = Bytes>,
    {
        let start = self.parts.len();
        for payload in parts {
            self.parts.push_back(QueuedPart {
                payload,
                more: true,
            });
        }
        if self.parts.len() > start {
            if let Some(last) = self.parts.back_mut() {
                last.more = false;
            }
        }
    }

    /// Pop the frontmost part, if any.
    pub fn pop_front(&mut self) -> Option<QueuedPart> {
        self.parts.pop_front()
    }

    /// Number of queued parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Discard everything.
    pub fn clear(&mut self) {
        self.parts.clear();
    }

    /// Diagnostic snapshot of the pending parts (lengths and MORE flags),
    /// used to enrich error events.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PartSnapshot> {
        self.parts
            .iter()
            .map(|part| PartSnapshot {
                len: part.payload.len(),
                more: part.more,
            })
            .collect()
    }
}
