//! Synthetic lifecycle payloads delivered by the runtime itself.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::payload::ReActorPayload;
use crate::reactor::ReActorRef;

/// First message every reactor receives, before any user traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReActorInit;

/// Last message every reactor receives, after its children terminated and
/// its mailbox drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReActorStop;

/// Wrapper around a payload whose destination did not resolve, delivered to
/// the system dead-letter reactor with the original sender preserved.
#[derive(Debug, Clone)]
pub struct DeadMessage {
    /// Reference of the original sender.
    pub sender: ReActorRef,
    /// The undeliverable payload.
    pub payload: Arc<dyn ReActorPayload>,
}

impl DeadMessage {
    /// Downcast the original payload.
    pub fn payload_as<T: ReActorPayload>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }
}
