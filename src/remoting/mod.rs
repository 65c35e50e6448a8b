//! Registry control plane: channel advertisement, peer discovery, routes.
//!
//! The remoting root is a system reactor whose children are registry
//! drivers (gossip-based, directory-based, or anything else speaking the
//! wire messages in [`messages`]). It publishes this system's channels,
//! subscribes to peer changes, and is the single writer of the
//! [`RoutingTable`] every remote send resolves against.

pub mod messages;
pub mod root;
pub mod routes;

pub use messages::{
    ReActorSystemChannelIdPublicationRequest, RegistryDriverInitComplete, RegistryGateRemoved,
    RegistryGateUpserted, RegistryServicePublicationFailed, RegistrySubscriptionComplete,
    ServiceCancellationRequest, ServiceServicePublicationRequest,
    SynchronizationWithServiceRegistryRequest,
};
pub use root::REMOTING_ROOT_NAME;
pub use routes::{Gate, RoutingTable};
