//! Bounded FIFO mailbox with backpressure.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::pin::pin;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::trace;

// Layer 3: Internal module imports
use super::backpressure::BackpressureStrategy;
use super::traits::Mailbox;
use crate::message::{DeliveryStatus, Message};

/// FIFO mailbox with a fixed capacity and a [`BackpressureStrategy`].
///
/// The synchronous path never blocks: at capacity it either evicts the
/// oldest message (`DropOldest`) or answers
/// [`DeliveryStatus::Backpressured`]. With the `Block` strategy,
/// `async_deliver` parks the sender until a batch is drained.
#[derive(Debug)]
pub struct BoundedMailbox {
    queue: Mutex<VecDeque<Message>>,
    capacity: usize,
    strategy: BackpressureStrategy,
    space: Notify,
}

impl BoundedMailbox {
    /// Create a mailbox holding at most `capacity` messages.
    pub fn new(capacity: usize, strategy: BackpressureStrategy) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            strategy,
            space: Notify::new(),
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn try_enqueue(&self, msg: Message) -> Result<(), Message> {
        let mut queue = self.queue.lock();
        if queue.len() < self.capacity {
            queue.push_back(msg);
            return Ok(());
        }
        if self.strategy == BackpressureStrategy::DropOldest {
            if let Some(evicted) = queue.pop_front() {
                trace!(
                    sequence = evicted.sequence(),
                    payload = evicted.payload_tag(),
                    "bounded mailbox evicted oldest message"
                );
            }
            queue.push_back(msg);
            return Ok(());
        }
        Err(msg)
    }
}

#[async_trait]
impl Mailbox for BoundedMailbox {
    fn deliver(&self, msg: Message) -> DeliveryStatus {
        match self.try_enqueue(msg) {
            Ok(()) => DeliveryStatus::Delivered,
            Err(_) => DeliveryStatus::Backpressured,
        }
    }

    async fn async_deliver(&self, msg: Message) -> DeliveryStatus {
        if self.strategy != BackpressureStrategy::Block {
            return self.deliver(msg);
        }

        loop {
            let mut notified = pin!(self.space.notified());
            {
                let mut queue = self.queue.lock();
                if queue.len() < self.capacity {
                    queue.push_back(msg);
                    return DeliveryStatus::Delivered;
                }
                // Register under the lock so a concurrent drain cannot
                // slip between the capacity check and the wait.
                notified.as_mut().enable();
            }
            notified.await;
        }
    }

    fn len(&self) -> usize {
        self.queue.lock().len()
    }

    fn dequeue_batch(&self, max: usize) -> Vec<Message> {
        let batch: Vec<Message> = {
            let mut queue = self.queue.lock();
            let take = max.min(queue.len());
            queue.drain(..take).collect()
        };
        if !batch.is_empty() {
            self.space.notify_waiters();
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AckingPolicy;
    use crate::reactor::ReActorRef;
    use crate::util::{ChannelId, ChannelType, ReActorId, ReActorSystemId};
    use std::sync::Arc;
    use std::time::Duration;

    fn msg(seq: u64) -> Message {
        let reference = ReActorRef::new(
            ReActorId::new("mbx"),
            ReActorSystemId::new("test"),
            ChannelId::new(ChannelType::DirectCommunication, "direct"),
        );
        Message::new(
            seq,
            reference.clone(),
            reference,
            AckingPolicy::None,
            Arc::new(seq),
        )
    }

    #[test]
    fn test_bounded_drop_newest_backpressures() {
        let mailbox = BoundedMailbox::new(2, BackpressureStrategy::DropNewest);

        assert_eq!(mailbox.deliver(msg(1)), DeliveryStatus::Delivered);
        assert_eq!(mailbox.deliver(msg(2)), DeliveryStatus::Delivered);
        assert_eq!(mailbox.deliver(msg(3)), DeliveryStatus::Backpressured);

        let sequences: Vec<u64> = mailbox.dequeue_batch(8).iter().map(Message::sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[test]
    fn test_bounded_drop_oldest_evicts_head() {
        let mailbox = BoundedMailbox::new(2, BackpressureStrategy::DropOldest);

        mailbox.deliver(msg(1));
        mailbox.deliver(msg(2));
        assert_eq!(mailbox.deliver(msg(3)), DeliveryStatus::Delivered);

        let sequences: Vec<u64> = mailbox.dequeue_batch(8).iter().map(Message::sequence).collect();
        assert_eq!(sequences, vec![2, 3]);
    }

    #[test]
    fn test_bounded_block_sync_path_backpressures() {
        let mailbox = BoundedMailbox::new(1, BackpressureStrategy::Block);

        mailbox.deliver(msg(1));
        assert_eq!(mailbox.deliver(msg(2)), DeliveryStatus::Backpressured);
    }

    #[tokio::test]
    async fn test_bounded_block_async_waits_for_drain() {
        let mailbox = Arc::new(BoundedMailbox::new(1, BackpressureStrategy::Block));
        mailbox.deliver(msg(1));

        let blocked = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.async_deliver(msg(2)).await })
        };

        // Give the sender time to park, then make space.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(mailbox.dequeue_batch(1).len(), 1);

        assert_eq!(blocked.await.ok(), Some(DeliveryStatus::Delivered));
        assert_eq!(mailbox.len(), 1);
    }
}
