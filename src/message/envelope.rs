//! Immutable message envelope and delivery vocabulary.

// Layer 1: Standard library imports
use std::any::TypeId;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::payload::ReActorPayload;
use crate::reactor::ReActorRef;

/// Whether and how the sender is told about delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckingPolicy {
    /// Fire and forget; the receipt reflects only the local send outcome.
    None,
    /// The sender's receipt resolves with the destination's delivery status.
    SenderRequired,
    /// The channel confirms delivery. Resolves on destination-mailbox
    /// acceptance; durable confirmation is a channel property, not part of
    /// the ack.
    ChannelRequired,
}

impl AckingPolicy {
    /// Whether this policy asks for a delivery confirmation at all.
    pub fn requires_ack(&self) -> bool {
        !matches!(self, AckingPolicy::None)
    }
}

/// Outcome of a delivery attempt.
///
/// Only [`DeliveryStatus::Delivered`] triggers rescheduling of the
/// destination reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// The destination mailbox accepted the message.
    Delivered,
    /// A bounded mailbox was full; the message was not enqueued.
    Backpressured,
    /// The message could not reach the destination.
    NotDelivered,
    /// The destination did not resolve; the payload went to dead letters.
    DeadLetter,
}

impl DeliveryStatus {
    /// Whether the destination mailbox accepted the message.
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered)
    }
}

/// Relative urgency of a message, used by the priority mailbox variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessagePriority {
    /// Background traffic, drained last.
    Low,
    /// Default priority.
    Normal,
    /// Drained before normal traffic.
    High,
    /// Control traffic, drained first.
    Critical,
}

impl Default for MessagePriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Immutable message envelope.
///
/// Carries the per-system monotonic sequence number, source and destination
/// references, the acking policy and the payload. The payload's `TypeId` is
/// captured once at construction so reaction dispatch never touches runtime
/// reflection on the hot path.
///
/// Cloning is cheap: the payload is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Message {
    sequence: u64,
    source: ReActorRef,
    destination: ReActorRef,
    ack_policy: AckingPolicy,
    timestamp: DateTime<Utc>,
    payload_type: TypeId,
    payload: Arc<dyn ReActorPayload>,
}

impl Message {
    /// Build an envelope stamped with the current time.
    pub fn new(
        sequence: u64,
        source: ReActorRef,
        destination: ReActorRef,
        ack_policy: AckingPolicy,
        payload: Arc<dyn ReActorPayload>,
    ) -> Self {
        Self {
            sequence,
            source,
            destination,
            ack_policy,
            timestamp: Utc::now(),
            payload_type: payload.as_any().type_id(),
            payload,
        }
    }

    /// Rebuild an envelope decoded from a channel, keeping the original
    /// send timestamp.
    pub(crate) fn from_wire(
        sequence: u64,
        source: ReActorRef,
        destination: ReActorRef,
        ack_policy: AckingPolicy,
        timestamp: DateTime<Utc>,
        payload: Arc<dyn ReActorPayload>,
    ) -> Self {
        Self {
            sequence,
            source,
            destination,
            ack_policy,
            timestamp,
            payload_type: payload.as_any().type_id(),
            payload,
        }
    }

    /// Per-system monotonic sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Reference of the sender.
    pub fn source(&self) -> &ReActorRef {
        &self.source
    }

    /// Reference of the destination.
    pub fn destination(&self) -> &ReActorRef {
        &self.destination
    }

    /// Acking policy requested by the sender.
    pub fn ack_policy(&self) -> AckingPolicy {
        self.ack_policy
    }

    /// When the envelope was first built.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// `TypeId` of the payload's concrete type, captured at send time.
    pub fn payload_type(&self) -> TypeId {
        self.payload_type
    }

    /// Borrow the payload.
    pub fn payload(&self) -> &dyn ReActorPayload {
        self.payload.as_ref()
    }

    /// Shared handle to the payload.
    pub fn payload_arc(&self) -> Arc<dyn ReActorPayload> {
        Arc::clone(&self.payload)
    }

    /// Diagnostic tag of the payload type.
    pub fn payload_tag(&self) -> &'static str {
        self.payload.payload_tag()
    }

    /// Downcast the payload to a concrete type.
    pub fn payload_as<T: ReActorPayload>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    /// Rebind the source reference to the ingress driver so replies route
    /// back through the same channel.
    pub(crate) fn bind_source(&mut self, driver: &std::sync::Arc<dyn crate::driver::ReActorSystemDriver>) {
        self.source.bind_driver(driver);
    }
}
