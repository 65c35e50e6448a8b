//! Location-transparent reactor references.

// Layer 1: Standard library imports
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::driver::ReActorSystemDriver;
use crate::message::{AckingPolicy, DeliveryReceipt, DeliveryStatus, ReActorPayload};
use crate::remoting::RoutingTable;
use crate::util::{ChannelId, ReActorId, ReActorSystemId};

/// How a reference finds the driver carrying its sends.
#[derive(Debug, Clone, Default)]
pub(crate) enum RefResolver {
    /// No driver attached; every send fails with `NotDelivered`. This is
    /// the state of a freshly deserialized reference before the ingress
    /// side rebinds it.
    #[default]
    Unbound,
    /// Pinned to one driver instance.
    Driver(Weak<dyn ReActorSystemDriver>),
    /// Resolved per send through the routing table, so registry updates
    /// take effect on the next `tell`.
    Routed(Weak<RoutingTable>),
}

/// Location-transparent handle to a reactor.
///
/// Two references are equal iff their reactor ids match; the owning system
/// id and channel id describe where sends are routed, not identity. All
/// sends go through a reference, never directly to the reactor.
///
/// References serialize as bare identities (the driver handle is skipped);
/// drivers rebind them on ingress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReActorRef {
    id: ReActorId,
    system_id: ReActorSystemId,
    channel_id: ChannelId,
    #[serde(skip)]
    resolver: RefResolver,
}

impl ReActorRef {
    /// Create an unbound reference from bare identities.
    pub fn new(id: ReActorId, system_id: ReActorSystemId, channel_id: ChannelId) -> Self {
        Self {
            id,
            system_id,
            channel_id,
            resolver: RefResolver::Unbound,
        }
    }

    /// The reactor id; the sole input to equality and hashing.
    pub fn id(&self) -> &ReActorId {
        &self.id
    }

    /// Id of the system owning the reactor.
    pub fn system_id(&self) -> &ReActorSystemId {
        &self.system_id
    }

    /// Channel this reference routes through.
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Pin the reference to a driver instance.
    pub(crate) fn bind_driver(&mut self, driver: &Arc<dyn ReActorSystemDriver>) {
        self.resolver = RefResolver::Driver(Arc::downgrade(driver));
    }

    /// Resolve the driver per send through the routing table.
    pub(crate) fn bind_routing(&mut self, routes: &Arc<RoutingTable>) {
        self.resolver = RefResolver::Routed(Arc::downgrade(routes));
    }

    /// A copy of this reference routed through `driver`'s channel instead.
    pub fn via(&self, driver: &Arc<dyn ReActorSystemDriver>) -> Self {
        let mut copy = Self::new(
            self.id.clone(),
            self.system_id.clone(),
            driver.channel_id().clone(),
        );
        copy.bind_driver(driver);
        copy
    }

    fn resolve_driver(&self) -> Option<Arc<dyn ReActorSystemDriver>> {
        match &self.resolver {
            RefResolver::Unbound => None,
            RefResolver::Driver(weak) => weak.upgrade(),
            RefResolver::Routed(weak) => weak
                .upgrade()
                .and_then(|routes| routes.find_route(&self.system_id, &self.channel_id))
                .and_then(|gate| gate.driver()),
        }
    }

    /// Fire-and-forget send with the system sink as the source.
    pub fn tell<P: ReActorPayload>(&self, payload: P) -> DeliveryReceipt {
        self.publish(None, AckingPolicy::None, Arc::new(payload))
    }

    /// Fire-and-forget send naming an explicit sender.
    pub fn tell_from<P: ReActorPayload>(&self, sender: &ReActorRef, payload: P) -> DeliveryReceipt {
        self.publish(Some(sender.clone()), AckingPolicy::None, Arc::new(payload))
    }

    /// Ack-tracked send with the system sink as the source.
    pub fn atell<P: ReActorPayload>(&self, payload: P, policy: AckingPolicy) -> DeliveryReceipt {
        self.publish(None, policy, Arc::new(payload))
    }

    /// Ack-tracked send naming an explicit sender.
    pub fn atell_from<P: ReActorPayload>(
        &self,
        sender: &ReActorRef,
        payload: P,
        policy: AckingPolicy,
    ) -> DeliveryReceipt {
        self.publish(Some(sender.clone()), policy, Arc::new(payload))
    }

    fn publish(
        &self,
        sender: Option<ReActorRef>,
        policy: AckingPolicy,
        payload: Arc<dyn ReActorPayload>,
    ) -> DeliveryReceipt {
        match self.resolve_driver() {
            Some(driver) => driver.publish(sender, self.clone(), policy, payload),
            None => DeliveryReceipt::ready(DeliveryStatus::NotDelivered),
        }
    }
}

impl PartialEq for ReActorRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ReActorRef {}

impl Hash for ReActorRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for ReActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.system_id, self.channel_id, self.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::util::ChannelType;

    fn unbound(name: &str) -> ReActorRef {
        ReActorRef::new(
            ReActorId::new(name),
            ReActorSystemId::new("test"),
            ChannelId::new(ChannelType::DirectCommunication, "direct"),
        )
    }

    #[test]
    fn test_ref_equality_by_reactor_id_only() {
        let a = unbound("same");
        let b = unbound("same");

        assert_eq!(a, b); // System ids differ, reactor ids match
        assert_ne!(a, unbound("other"));
    }

    #[tokio::test]
    async fn test_unbound_ref_send_is_not_delivered() {
        let reference = unbound("nobody");
        assert_eq!(
            reference.tell("hello".to_string()).await,
            DeliveryStatus::NotDelivered
        );
    }

    #[test]
    fn test_ref_serde_drops_driver_binding() {
        let reference = unbound("wire");
        let json = serde_json::to_string(&reference).unwrap();
        let back: ReActorRef = serde_json::from_str(&json).unwrap();

        assert_eq!(reference, back);
        assert!(matches!(back.resolver, RefResolver::Unbound));
    }
}
