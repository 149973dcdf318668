use std::collections::VecDeque;
use std::sync::RwLock;

use super::types::NormalizedEvent;

pub const DEFAULT_CAPACITY: usize = 1000;

/// Fixed-capacity FIFO of the most recent normalized events.
///
/// The pipeline is the only writer; API handlers snapshot concurrently.
/// Once capacity is reached the oldest entry is evicted on every push, so
/// memory stays bounded no matter how fast events arrive. Contents are
/// volatile: they live and die with the process.
#[derive(Debug)]
pub struct EventBuffer {
    inner: RwLock<VecDeque<NormalizedEvent>>,
    capacity: usize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an event, evicting the oldest entry once over capacity.
    pub fn push(&self, event: NormalizedEvent) {
        let mut queue = self.inner.write().unwrap_or_else(|e| e.into_inner());
        queue.push_back(event);
        if queue.len() > self.capacity {
            queue.pop_front();
        }
    }

    /// The last `n` events in arrival order. `n` is clamped to the current
    /// size.
    pub fn recent(&self, n: usize) -> Vec<NormalizedEvent> {
        let queue = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let skip = queue.len().saturating_sub(n);
        queue.iter().skip(skip).cloned().collect()
    }

    /// Snapshot copy of the whole buffer; later pushes do not alter it.
    pub fn all(&self) -> Vec<NormalizedEvent> {
        let queue = self.inner.read().unwrap_or_else(|e| e.into_inner());
        queue.iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::test_event;
    use crate::events::types::EventType;

    #[test]
    fn push_and_recent_preserve_arrival_order() {
        let buffer = EventBuffer::new(10);
        for id in 1..=3 {
            buffer.push(test_event(id, EventType::Chat));
        }

        let recent: Vec<i64> = buffer.recent(3).iter().map(|e| e.id).collect();
        assert_eq!(recent, vec![1, 2, 3]);
    }

    #[test]
    fn recent_clamps_to_current_size() {
        let buffer = EventBuffer::new(10);
        buffer.push(test_event(1, EventType::Bits));

        assert_eq!(buffer.recent(100).len(), 1);
        assert!(buffer.recent(0).is_empty());
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let buffer = EventBuffer::new(1000);
        for id in 1..=1200 {
            buffer.push(test_event(id, EventType::Chat));
        }

        assert_eq!(buffer.len(), 1000);
        assert_eq!(buffer.recent(1)[0].id, 1200);

        let all = buffer.all();
        assert_eq!(all.first().unwrap().id, 201);
        assert_eq!(all.last().unwrap().id, 1200);
    }

    #[test]
    fn snapshots_are_isolated_from_later_pushes() {
        let buffer = EventBuffer::new(10);
        buffer.push(test_event(1, EventType::Follow));

        let snapshot = buffer.all();
        buffer.push(test_event(2, EventType::Follow));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn clear_empties_the_buffer() {
        let buffer = EventBuffer::new(10);
        buffer.push(test_event(1, EventType::Raid));
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 10);
    }
}
