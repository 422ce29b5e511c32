use crate::core::envelope::Envelope;
use std::collections::VecDeque;

/// FIFO buffer for messages sent while the socket is not open
///
/// Bounded: once `capacity` is reached the oldest entry is evicted so the
/// most recent state wins.
#[derive(Debug)]
pub struct OutboundQueue {
    items: VecDeque<Envelope>,
    capacity: usize,
}

impl OutboundQueue {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a message, returning the evicted oldest entry if full
    pub fn push(&mut self, message: Envelope) -> Option<Envelope> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(message);
        evicted
    }

    /// Take every queued message in enqueue order
    pub fn drain(&mut self) -> Vec<Envelope> {
        self.items.drain(..).collect()
    }

    /// Drop every queued message, returning how many were discarded
    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
