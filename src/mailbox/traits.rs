//! The mailbox contract consumed by drivers and the dispatcher.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::message::{DeliveryStatus, Message};

/// Ordered, single-consumer message queue for one reactor.
///
/// Senders may be many and concurrent; the consumer side is serialized by
/// the owning context's scheduling flag, so `dequeue_batch` is never raced
/// by two workers.
///
/// Bounded implementations answer [`DeliveryStatus::Backpressured`] from
/// the synchronous path when full; only `async_deliver` may wait for
/// capacity, and only when the variant's strategy says so.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Enqueue synchronously. Never blocks.
    fn deliver(&self, msg: Message) -> DeliveryStatus;

    /// Enqueue with an asynchronous completion. The default forwards to
    /// [`Mailbox::deliver`]; blocking variants override it to wait for
    /// capacity.
    async fn async_deliver(&self, msg: Message) -> DeliveryStatus {
        self.deliver(msg)
    }

    /// Whether the queue currently holds no messages.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of queued messages.
    fn len(&self) -> usize;

    /// Remove and return up to `max` messages in queue order.
    fn dequeue_batch(&self, max: usize) -> Vec<Message>;
}
