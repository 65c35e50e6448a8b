//! Routing table mapping peer gates to local channel drivers.

// Layer 1: Standard library imports
use std::sync::{Arc, Weak};

// Layer 2: Third-party crate imports
use dashmap::DashMap;

// Layer 3: Internal module imports
use crate::driver::{ChannelProperties, ReActorSystemDriver};
use crate::util::{ChannelId, ReActorSystemId};

/// A peer's advertised channel entry plus the local driver carrying
/// traffic towards it.
///
/// A gate without a usable driver (no local channel of that kind exists)
/// still occupies the table, but sends through it fail `NotDelivered`.
#[derive(Debug, Clone)]
pub struct Gate {
    system_id: ReActorSystemId,
    channel_id: ChannelId,
    properties: ChannelProperties,
    driver: Option<Weak<dyn ReActorSystemDriver>>,
}

impl Gate {
    /// Assemble a gate entry.
    pub fn new(
        system_id: ReActorSystemId,
        channel_id: ChannelId,
        properties: ChannelProperties,
        driver: Option<Weak<dyn ReActorSystemDriver>>,
    ) -> Self {
        Self {
            system_id,
            channel_id,
            properties,
            driver,
        }
    }

    /// The peer system this gate reaches.
    pub fn system_id(&self) -> &ReActorSystemId {
        &self.system_id
    }

    /// The advertised channel.
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// The advertised channel metadata.
    pub fn properties(&self) -> &ChannelProperties {
        &self.properties
    }

    /// The local driver carrying sends through this gate, while alive.
    pub fn driver(&self) -> Option<Arc<dyn ReActorSystemDriver>> {
        self.driver.as_ref().and_then(Weak::upgrade)
    }
}

/// Peer (system id, channel id) to [`Gate`] mapping.
///
/// Single writer: only the remoting root mutates it, on registry events.
/// Readers are the send paths of routed references, which resolve per
/// send so registry changes take effect immediately.
#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: DashMap<(ReActorSystemId, ChannelId), Gate>,
}

impl RoutingTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the gate for its (system, channel) pair.
    pub(crate) fn register_route(&self, gate: Gate) {
        self.routes
            .insert((gate.system_id.clone(), gate.channel_id.clone()), gate);
    }

    /// Drop a gate. Returns whether one existed.
    pub(crate) fn unregister_route(
        &self,
        system_id: &ReActorSystemId,
        channel_id: &ChannelId,
    ) -> bool {
        self.routes
            .remove(&(system_id.clone(), channel_id.clone()))
            .is_some()
    }

    /// Resolve the gate for a peer channel.
    pub fn find_route(&self, system_id: &ReActorSystemId, channel_id: &ChannelId) -> Option<Gate> {
        self.routes
            .get(&(system_id.clone(), channel_id.clone()))
            .map(|entry| entry.value().clone())
    }

    /// Number of registered gates.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no gate is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
