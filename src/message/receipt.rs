//! Delivery receipts: the sender-side completion of a send.

// Layer 1: Standard library imports
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

// Layer 2: Third-party crate imports
use tokio::sync::oneshot;

// Layer 3: Internal module imports
use super::envelope::DeliveryStatus;

/// Future resolving to the [`DeliveryStatus`] of one send.
///
/// Resolves exactly once. Dropping the receipt detaches the waiter; the
/// underlying send is not revoked. A receipt whose ack trigger disappears
/// (for example because its driver was cleaned) resolves
/// [`DeliveryStatus::NotDelivered`].
#[derive(Debug)]
pub struct DeliveryReceipt {
    state: ReceiptState,
}

#[derive(Debug)]
enum ReceiptState {
    Ready(Option<DeliveryStatus>),
    Pending(oneshot::Receiver<DeliveryStatus>),
}

impl DeliveryReceipt {
    /// A receipt already resolved with `status`.
    pub fn ready(status: DeliveryStatus) -> Self {
        Self {
            state: ReceiptState::Ready(Some(status)),
        }
    }

    /// A pending receipt plus the trigger that resolves it.
    pub(crate) fn pending() -> (oneshot::Sender<DeliveryStatus>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                state: ReceiptState::Pending(rx),
            },
        )
    }
}

impl Future for DeliveryReceipt {
    type Output = DeliveryStatus;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            ReceiptState::Ready(status) => {
                Poll::Ready(status.take().unwrap_or(DeliveryStatus::NotDelivered))
            }
            ReceiptState::Pending(rx) => Pin::new(rx)
                .poll(cx)
                .map(|result| result.unwrap_or(DeliveryStatus::NotDelivered)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_receipt_resolves_immediately() {
        let receipt = DeliveryReceipt::ready(DeliveryStatus::Delivered);
        assert_eq!(receipt.await, DeliveryStatus::Delivered);
    }

    #[tokio::test]
    async fn test_pending_receipt_resolves_on_trigger() {
        let (trigger, receipt) = DeliveryReceipt::pending();
        let waiter = tokio::spawn(receipt);

        let _ = trigger.send(DeliveryStatus::Backpressured);
        assert_eq!(waiter.await.ok(), Some(DeliveryStatus::Backpressured));
    }

    #[tokio::test]
    async fn test_dropped_trigger_resolves_not_delivered() {
        let (trigger, receipt) = DeliveryReceipt::pending();
        drop(trigger);

        assert_eq!(receipt.await, DeliveryStatus::NotDelivered);
    }
}
