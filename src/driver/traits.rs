//! The driver contract and its shared building blocks.

// Layer 1: Standard library imports
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::error::DriverError;
use crate::message::{AckingPolicy, DeliveryReceipt, DeliveryStatus, Message, ReActorPayload};
use crate::reactor::ReActorRef;
use crate::system::ReActorSystem;
use crate::util::ChannelId;

/// Free-form channel metadata advertised through the registry.
///
/// Keys are ordered so the wire form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelProperties(BTreeMap<String, String>);

impl ChannelProperties {
    /// Empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate the properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Pending delivery confirmations keyed by envelope sequence number.
///
/// When a sender requests an ack on a channel without native delivery
/// confirmation, the driver registers a trigger here before sending; the
/// ingress side completes it when the matching delivery is observed.
/// Every trigger resolves exactly once; [`AckTracker::drain`] settles
/// leftovers when a driver is cleaned.
#[derive(Debug, Default)]
pub struct AckTracker {
    pending: DashMap<u64, tokio::sync::oneshot::Sender<DeliveryStatus>>,
}

impl AckTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending ack and hand back the receipt resolving it.
    pub fn register(&self, sequence: u64) -> DeliveryReceipt {
        let (trigger, receipt) = DeliveryReceipt::pending();
        self.pending.insert(sequence, trigger);
        receipt
    }

    /// Complete the pending ack for `sequence`, if any. Returns whether a
    /// trigger existed.
    pub fn complete(&self, sequence: u64, status: DeliveryStatus) -> bool {
        match self.pending.remove(&sequence) {
            Some((_, trigger)) => {
                let _ = trigger.send(status);
                true
            }
            None => false,
        }
    }

    /// Resolve every pending ack with `status`.
    pub fn drain(&self, status: DeliveryStatus) {
        let sequences: Vec<u64> = self.pending.iter().map(|entry| *entry.key()).collect();
        for sequence in sequences {
            self.complete(sequence, status);
        }
    }

    /// Number of unresolved acks.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// State shared by every driver implementation: the owning system handle
/// and the pending-ack table.
#[derive(Debug, Default)]
pub struct DriverCtx {
    system: OnceLock<ReActorSystem>,
    acks: AckTracker,
}

impl DriverCtx {
    /// Fresh, unattached driver state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the owning system exactly once.
    pub fn attach(&self, system: ReActorSystem) -> Result<(), DriverError> {
        self.system
            .set(system)
            .map_err(|_| DriverError::AlreadyInitialized)
    }

    /// The owning system, if the driver was initialized.
    pub fn system(&self) -> Option<&ReActorSystem> {
        self.system.get()
    }

    /// The pending-ack table.
    pub fn acks(&self) -> &AckTracker {
        &self.acks
    }
}

/// One channel's ingress/egress driver.
///
/// Implementations own the channel resources end to end: they are
/// acquired in `init_driver_loop` and released in `clean_driver_loop` on
/// every exit path, including loop shutdown and init failure.
#[async_trait]
pub trait ReActorSystemDriver: Send + Sync + 'static {
    /// Channel this driver owns.
    fn channel_id(&self) -> &ChannelId;

    /// Channel metadata advertised through the registry.
    fn channel_properties(&self) -> &ChannelProperties;

    /// Whether the channel natively confirms delivery, making the
    /// pending-ack table unnecessary.
    fn channel_requires_delivery_ack(&self) -> bool;

    /// Shared driver state.
    fn driver_ctx(&self) -> &DriverCtx;

    /// Acquire channel resources and start the ingress loop on its
    /// dedicated thread.
    ///
    /// # Errors
    /// A failure is fatal for this driver only.
    async fn init_driver_loop(self: Arc<Self>, system: ReActorSystem) -> Result<(), DriverError>;

    /// Release channel resources. Idempotent.
    async fn clean_driver_loop(&self) -> Result<(), DriverError>;

    /// Synchronous egress. For local drivers the destination is resolved
    /// in-process; for remote drivers it is a routing entry.
    fn send_message(&self, destination: &ReActorRef, msg: Message) -> DeliveryStatus;

    /// Asynchronous egress; defaults to the synchronous path.
    async fn send_async_message(&self, destination: &ReActorRef, msg: Message) -> DeliveryStatus {
        self.send_message(destination, msg)
    }

    /// Build the envelope for one send and route it through this channel,
    /// tracking an ack when the policy asks for one.
    ///
    /// With no explicit source the system sink ref is stamped as sender.
    fn publish(
        &self,
        source: Option<ReActorRef>,
        destination: ReActorRef,
        policy: AckingPolicy,
        payload: Arc<dyn ReActorPayload>,
    ) -> DeliveryReceipt {
        let Some(system) = self.driver_ctx().system() else {
            return DeliveryReceipt::ready(DeliveryStatus::NotDelivered);
        };
        let source = source.unwrap_or_else(|| system.sink_ref());
        let sequence = system.next_sequence();
        let msg = Message::new(sequence, source, destination.clone(), policy, payload);

        if policy.requires_ack() && !self.channel_requires_delivery_ack() {
            let receipt = self.driver_ctx().acks().register(sequence);
            let status = self.send_message(&destination, msg);
            if !status.is_delivered() {
                // The send never reached the channel; the ingress side
                // will not observe it, settle the ack here.
                self.driver_ctx().acks().complete(sequence, status);
            }
            receipt
        } else {
            DeliveryReceipt::ready(self.send_message(&destination, msg))
        }
    }
}
