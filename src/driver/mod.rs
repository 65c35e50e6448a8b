//! Channel drivers: message ingress and egress.
//!
//! A driver owns exactly one channel. Egress goes through
//! [`ReActorSystemDriver::send_message`]; ingress loops read inbound
//! envelopes and hand them to [`offer_message`], which deposits into the
//! destination mailbox, reschedules the reactor, completes pending acks,
//! fans out intercept copies and reroutes unresolvable payloads to the
//! dead-letter reactor.
//!
//! # Implementations
//!
//! - [`DirectCommunicationDriver`] - in-process loopback; `send` is the
//!   delivery itself
//! - [`JournalDriver`] - persistent journal-backed local channel; the
//!   canonical ordering substrate

pub mod direct;
pub mod error;
pub mod journal;
pub mod traits;

pub use direct::DirectCommunicationDriver;
pub use error::DriverError;
pub use journal::{JournalDriver, JournalDriverConfig};
pub use traits::{AckTracker, ChannelProperties, DriverCtx, ReActorSystemDriver};

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::message::{DeliveryStatus, Message};

/// Hand one inbound envelope to the destination reactor.
///
/// Resolves the destination context by reactor id, deposits through the
/// synchronous mailbox path and reschedules the context on success. The
/// driver's pending ack for the envelope's sequence number is completed
/// with the resulting status either way; an unresolved destination routes
/// the payload to dead letters and completes the ack `NotDelivered`.
pub(crate) fn offer_message(driver: &dyn ReActorSystemDriver, msg: Message) -> DeliveryStatus {
    let Some(system) = driver.driver_ctx().system() else {
        return DeliveryStatus::NotDelivered;
    };
    let sequence = msg.sequence();
    let status = match system.context_by_id(msg.destination().id()) {
        Some(ctx) => {
            let status = ctx.deliver(msg.clone());
            if status.is_delivered() {
                system.dispatcher().dispatch(&ctx);
            }
            status
        }
        None => {
            system.route_dead_letter(&msg);
            DeliveryStatus::NotDelivered
        }
    };
    driver.driver_ctx().acks().complete(sequence, status);
    system.run_intercepts(&msg);
    status
}

/// [`offer_message`] through the asynchronous mailbox path, so blocking
/// bounded mailboxes may wait for capacity instead of backpressuring.
pub(crate) async fn offer_message_async(
    driver: &dyn ReActorSystemDriver,
    msg: Message,
) -> DeliveryStatus {
    let Some(system) = driver.driver_ctx().system() else {
        return DeliveryStatus::NotDelivered;
    };
    let sequence = msg.sequence();
    let status = match system.context_by_id(msg.destination().id()) {
        Some(ctx) => {
            let status = ctx.async_deliver(msg.clone()).await;
            if status.is_delivered() {
                system.dispatcher().dispatch(&ctx);
            }
            status
        }
        None => {
            system.route_dead_letter(&msg);
            DeliveryStatus::NotDelivered
        }
    };
    driver.driver_ctx().acks().complete(sequence, status);
    system.run_intercepts(&msg);
    status
}
