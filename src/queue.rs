use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_queue::SegQueue;

/// A rendered line tagged with its position in the enqueue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedLine {
    pub seq: u64,
    pub line: String,
}

/// Unbounded, lock-free FIFO of rendered lines.
///
/// Any number of producers may push; exactly one writer session pops.
/// Every push is numbered, so a consumer can tell lines enqueued before a
/// given point (see [`next_seq`](Self::next_seq)) from lines enqueued after it.
#[derive(Debug, Default)]
pub struct DeliveryQueue {
    lines: SegQueue<QueuedLine>,
    next_seq: AtomicU64,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a line and return its sequence number. Never blocks.
    pub fn push(&self, line: String) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.lines.push(QueuedLine { seq, line });
        seq
    }

    /// Dequeue the oldest line, if any.
    pub fn pop(&self) -> Option<QueuedLine> {
        self.lines.pop()
    }

    /// Sequence number the next push will receive.
    pub fn next_seq(&self) -> u64 {
        self.next_seq.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
