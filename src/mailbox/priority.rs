//! Priority mailbox: drains by urgency, arrival order within a class.

// Layer 1: Standard library imports
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::traits::Mailbox;
use crate::message::{DeliveryStatus, Message, MessagePriority, ReActorInit, ReActorStop};

/// Assigns a [`MessagePriority`] to each arriving envelope.
pub type PriorityClassifier = Arc<dyn Fn(&Message) -> MessagePriority + Send + Sync>;

struct Prioritized {
    priority: MessagePriority,
    arrival: u64,
    msg: Message,
}

impl PartialEq for Prioritized {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.arrival == other.arrival
    }
}

impl Eq for Prioritized {}

impl PartialOrd for Prioritized {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Prioritized {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority wins, then the earlier arrival.
        self.priority
            .cmp(&other.priority)
            .then(other.arrival.cmp(&self.arrival))
    }
}

/// Unbounded mailbox drained in priority order.
///
/// The classifier runs once per delivery. Messages of equal priority keep
/// their arrival order, so per-sender FIFO holds within a priority class.
/// The default classifier puts lifecycle messages ahead of user traffic.
pub struct PriorityMailbox {
    heap: Mutex<BinaryHeap<Prioritized>>,
    arrivals: AtomicU64,
    classifier: PriorityClassifier,
}

impl PriorityMailbox {
    /// Create a mailbox with an explicit classifier.
    pub fn new(classifier: PriorityClassifier) -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            arrivals: AtomicU64::new(0),
            classifier,
        }
    }

    /// Classifier ranking [`ReActorInit`] and [`ReActorStop`] as
    /// [`MessagePriority::Critical`] and everything else as normal.
    pub fn lifecycle_first() -> Self {
        Self::new(Arc::new(|msg: &Message| {
            if msg.payload_as::<ReActorInit>().is_some() || msg.payload_as::<ReActorStop>().is_some()
            {
                MessagePriority::Critical
            } else {
                MessagePriority::Normal
            }
        }))
    }
}

impl fmt::Debug for PriorityMailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityMailbox")
            .field("len", &self.len())
            .finish()
    }
}

impl Mailbox for PriorityMailbox {
    fn deliver(&self, msg: Message) -> DeliveryStatus {
        let priority = (self.classifier)(&msg);
        let arrival = self.arrivals.fetch_add(1, AtomicOrdering::Relaxed);
        self.heap.lock().push(Prioritized {
            priority,
            arrival,
            msg,
        });
        DeliveryStatus::Delivered
    }

    fn len(&self) -> usize {
        self.heap.lock().len()
    }

    fn dequeue_batch(&self, max: usize) -> Vec<Message> {
        let mut heap = self.heap.lock();
        let take = max.min(heap.len());
        (0..take)
            .filter_map(|_| heap.pop())
            .map(|entry| entry.msg)
            .collect()
    }
}
