//! In-process loopback driver.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use super::error::DriverError;
use super::traits::{ChannelProperties, DriverCtx, ReActorSystemDriver};
use super::{offer_message, offer_message_async};
use crate::message::{DeliveryStatus, Message};
use crate::reactor::ReActorRef;
use crate::system::ReActorSystem;
use crate::util::{ChannelId, ChannelType};

/// The direct-delivery sub-driver: deposits straight into the destination
/// mailbox.
///
/// Every system owns one; local references are bound to it at spawn.
/// Sending *is* the delivery, so the channel natively confirms acks and
/// the pending-ack table is never used.
#[derive(Debug)]
pub struct DirectCommunicationDriver {
    channel_id: ChannelId,
    properties: ChannelProperties,
    ctx: DriverCtx,
}

impl DirectCommunicationDriver {
    /// Create the loopback driver.
    pub fn new() -> Self {
        Self {
            channel_id: ChannelId::new(ChannelType::DirectCommunication, "direct"),
            properties: ChannelProperties::new(),
            ctx: DriverCtx::new(),
        }
    }
}

impl Default for DirectCommunicationDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReActorSystemDriver for DirectCommunicationDriver {
    fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    fn channel_properties(&self) -> &ChannelProperties {
        &self.properties
    }

    fn channel_requires_delivery_ack(&self) -> bool {
        true
    }

    fn driver_ctx(&self) -> &DriverCtx {
        &self.ctx
    }

    async fn init_driver_loop(self: Arc<Self>, system: ReActorSystem) -> Result<(), DriverError> {
        self.ctx.attach(system)
    }

    async fn clean_driver_loop(&self) -> Result<(), DriverError> {
        Ok(())
    }

    fn send_message(&self, _destination: &ReActorRef, msg: Message) -> DeliveryStatus {
        offer_message(self, msg)
    }

    async fn send_async_message(&self, _destination: &ReActorRef, msg: Message) -> DeliveryStatus {
        offer_message_async(self, msg).await
    }
}
