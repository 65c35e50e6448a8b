//! Unbounded FIFO mailbox.

// Layer 1: Standard library imports
use std::collections::VecDeque;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::traits::Mailbox;
use crate::message::{DeliveryStatus, Message};

/// FIFO mailbox without a capacity limit.
///
/// Every delivery succeeds; memory is the only bound. Use for reactors
/// whose ingress rate is known to be controlled elsewhere.
#[derive(Debug, Default)]
pub struct UnboundedMailbox {
    queue: Mutex<VecDeque<Message>>,
}

impl UnboundedMailbox {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mailbox for UnboundedMailbox {
    fn deliver(&self, msg: Message) -> DeliveryStatus {
        self.queue.lock().push_back(msg);
        DeliveryStatus::Delivered
    }

    fn len(&self) -> usize {
        self.queue.lock().len()
    }

    fn dequeue_batch(&self, max: usize) -> Vec<Message> {
        let mut queue = self.queue.lock();
        let take = max.min(queue.len());
        queue.drain(..take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AckingPolicy;
    use crate::reactor::ReActorRef;
    use crate::util::{ChannelId, ChannelType, ReActorId, ReActorSystemId};
    use std::sync::Arc;

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
    fn test_unbounded_fifo_order() {
        let mailbox = UnboundedMailbox::new();
        for seq in 0..5 {
            assert_eq!(mailbox.deliver(msg(seq)), DeliveryStatus::Delivered);
        }

        let batch = mailbox.dequeue_batch(3);
        let sequences: Vec<u64> = batch.iter().map(Message::sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(mailbox.len(), 2);
    }

    #[test]
    fn test_unbounded_batch_larger_than_queue() {
        let mailbox = UnboundedMailbox::new();
        mailbox.deliver(msg(1));

        assert_eq!(mailbox.dequeue_batch(16).len(), 1);
        assert!(mailbox.is_empty());
    }
}
