//! Registry wire messages.
//!
//! All of these cross registry channels and are therefore serializable;
//! the system registers them with its payload codec at construction.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::driver::ChannelProperties;
use crate::reactor::ReActorRef;
use crate::util::{ChannelId, ReActorSystemId};

/// A registry driver finished its own initialization and is ready to
/// serve; sent to the remoting root, which answers with a
/// [`SynchronizationWithServiceRegistryRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDriverInitComplete;

/// A registry driver established its subscription to registry changes;
/// the remoting root answers by publishing the local channel set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySubscriptionComplete;

/// Bootstrap request asking a registry driver to synchronize against the
/// service registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynchronizationWithServiceRegistryRequest;

/// Advertise one local channel to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReActorSystemChannelIdPublicationRequest {
    /// The advertising system.
    pub system_id: ReActorSystemId,
    /// The advertised channel.
    pub channel_id: ChannelId,
    /// Channel metadata peers need to reach it.
    pub properties: ChannelProperties,
}

/// A peer's channel advertisement appeared or changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryGateUpserted {
    /// The advertising system.
    pub system_id: ReActorSystemId,
    /// The advertised channel.
    pub channel_id: ChannelId,
    /// Channel metadata.
    pub channel_data: ChannelProperties,
}

/// A channel advertisement disappeared from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryGateRemoved {
    /// The system whose advertisement was removed.
    pub system_id: ReActorSystemId,
    /// The removed channel.
    pub channel_id: ChannelId,
}

/// Publish an application service behind a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceServicePublicationRequest {
    /// Reference receiving traffic for the service.
    pub service_gate: ReActorRef,
    /// Service metadata.
    pub service_properties: ChannelProperties,
}

/// Withdraw a previously published service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCancellationRequest {
    /// The system withdrawing the service.
    pub system_id: ReActorSystemId,
    /// Name the service was published under.
    pub service_name: String,
}

/// A registry driver failed to publish a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryServicePublicationFailed {
    /// Name of the service that failed to publish.
    pub service_name: String,
    /// Why the publication failed.
    pub error: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::util::ChannelType;

    #[test]
    fn test_publication_request_serde_round_trip() {
        let request = ReActorSystemChannelIdPublicationRequest {
            system_id: ReActorSystemId::new("node-a"),
            channel_id: ChannelId::new(ChannelType::LocalJournal, "main"),
            properties: ChannelProperties::new().with("durable", "true"),
        };

        let json = serde_json::to_string(&request).unwrap();
        let back: ReActorSystemChannelIdPublicationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }

    #[test]
    fn test_gate_upserted_serde_round_trip() {
        let upserted = RegistryGateUpserted {
            system_id: ReActorSystemId::new("node-b"),
            channel_id: ChannelId::new(ChannelType::Custom("grpc".to_string()), "edge"),
            channel_data: ChannelProperties::new().with("endpoint", "10.0.0.2:9099"),
        };

        let json = serde_json::to_vec(&upserted).unwrap();
        let back: RegistryGateUpserted = serde_json::from_slice(&json).unwrap();
        assert_eq!(upserted, back);
    }
}
