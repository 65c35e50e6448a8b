//! Message model: dynamic payloads, immutable envelopes, delivery receipts.
//!
//! Payloads are dynamically typed (`Arc<dyn ReActorPayload>`) so that one
//! mailbox carries any registered message type; reaction tables dispatch on
//! the payload's `TypeId`, precomputed at send time. Payload types that must
//! cross a non-local channel are registered once with the [`PayloadCodec`],
//! which pairs a wire tag with serde encode/decode functions.

pub mod control;
pub mod envelope;
pub mod payload;
pub mod receipt;
pub mod wire;

pub use control::{DeadMessage, ReActorInit, ReActorStop};
pub use envelope::{AckingPolicy, DeliveryStatus, Message, MessagePriority};
pub use payload::{CodecError, PayloadCodec, ReActorPayload};
pub use receipt::DeliveryReceipt;
pub use wire::WireMessage;
