//! Integration tests for the registry control plane.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{start_system, wait_until};
use parking_lot::Mutex;
use reactor_rt::prelude::*;
use reactor_rt::remoting::{
    ReActorSystemChannelIdPublicationRequest, RegistryDriverInitComplete, RegistryGateRemoved,
    RegistryGateUpserted, RegistrySubscriptionComplete, SynchronizationWithServiceRegistryRequest,
};

/// Spawn a fake registry driver as a child of the remoting root,
/// recording what the root sends it.
async fn spawn_registry_driver(
    system: &ReActorSystem,
    name: &str,
) -> (ReActorRef, Arc<Mutex<Vec<String>>>) {
    let received: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let remoting_root = system.remoting_root().unwrap();

    let sync_log = Arc::clone(&received);
    let publication_log = Arc::clone(&received);
    let reference = system
        .spawn_child(
            &remoting_root,
            ReActorConfig::named(name),
            ReActions::new()
                .on::<ReActorInit, _, _>(|ctx, _init| async move {
                    // Announce ourselves to the remoting root.
                    ctx.parent_ref().tell_from(ctx.self_ref(), RegistryDriverInitComplete);
                })
                .on::<SynchronizationWithServiceRegistryRequest, _, _>(move |ctx, _sync| {
                    let sync_log = Arc::clone(&sync_log);
                    async move {
                        sync_log.lock().push("sync".to_string());
                        // Subscription established; ask for the local
                        // channel set.
                        ctx.reply(RegistrySubscriptionComplete);
                    }
                })
                .on::<ReActorSystemChannelIdPublicationRequest, _, _>(move |_ctx, publication| {
                    let publication_log = Arc::clone(&publication_log);
                    async move {
                        publication_log
                            .lock()
                            .push(format!("publish:{}", publication.channel_id));
                    }
                }),
        )
        .await
        .unwrap();
    (reference, received)
}

async fn journal_system(name: &str, dir: &std::path::Path) -> (ReActorSystem, ChannelId) {
    let system = start_system(name).await;
    let driver: Arc<dyn ReActorSystemDriver> = Arc::new(JournalDriver::new(
        JournalDriverConfig::new("main", dir),
    ));
    let channel_id = driver.channel_id().clone();
    system.register_driver(driver).await.unwrap();
    (system, channel_id)
}

// ============================================================================
// Bootstrap: init -> sync -> subscription -> publication
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_registry_bootstrap_publishes_local_channels() {
    let dir = tempfile::tempdir().unwrap();
    let (system, channel_id) = journal_system("bootstrap", dir.path()).await;

    let (_driver_ref, received) = spawn_registry_driver(&system, "fake-registry").await;

    assert!(
        wait_until(Duration::from_secs(2), || {
            received.lock().as_slice()
                == ["sync".to_string(), format!("publish:{channel_id}")]
        })
        .await,
        "registry driver saw {:?}",
        received.lock().clone()
    );

    system.shutdown().await.unwrap();
}

// ============================================================================
// Gate upsert / removal and routing convergence
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_gate_upsert_then_remove_controls_routing() {
    let dir = tempfile::tempdir().unwrap();
    let (system, channel_id) = journal_system("gates", dir.path()).await;
    let remoting_root = system.remoting_root().unwrap();

    let peer = ReActorSystemId::new("node-b");
    remoting_root.tell(RegistryGateUpserted {
        system_id: peer.clone(),
        channel_id: channel_id.clone(),
        channel_data: ChannelProperties::new().with("endpoint", "peer-host"),
    });

    assert!(
        wait_until(Duration::from_secs(2), || {
            system.find_gate(&peer, &channel_id).is_some()
        })
        .await
    );
    let gate = system.find_gate(&peer, &channel_id).unwrap();
    assert_eq!(gate.properties().get("endpoint"), Some("peer-host"));

    // A routed reference resolves through the gate's local driver: the
    // send reaches the channel (journal append succeeds).
    let remote = system.remote_ref(peer.clone(), channel_id.clone(), "svc");
    let status = remote.atell(RegistrySubscriptionComplete, AckingPolicy::None).await;
    assert_eq!(status, DeliveryStatus::Delivered);

    remoting_root.tell(RegistryGateRemoved {
        system_id: peer.clone(),
        channel_id: channel_id.clone(),
    });
    assert!(
        wait_until(Duration::from_secs(2), || {
            system.find_gate(&peer, &channel_id).is_none()
        })
        .await
    );

    // With the gate gone, the same reference stops resolving.
    let status = remote.atell(RegistrySubscriptionComplete, AckingPolicy::None).await;
    assert_eq!(status, DeliveryStatus::NotDelivered);

    system.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_own_gate_upsert_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (system, channel_id) = journal_system("self-gate", dir.path()).await;
    let remoting_root = system.remoting_root().unwrap();

    remoting_root.tell(RegistryGateUpserted {
        system_id: system.id().clone(),
        channel_id: channel_id.clone(),
        channel_data: ChannelProperties::new(),
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(system.find_gate(system.id(), &channel_id).is_none());

    system.shutdown().await.unwrap();
}

// ============================================================================
// Self-heal: losing our own gate triggers a full re-publish
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_removed_local_gate_triggers_republish() {
    let dir = tempfile::tempdir().unwrap();
    let (system, channel_id) = journal_system("self-heal", dir.path()).await;

    let (_driver_ref, received) = spawn_registry_driver(&system, "fake-registry").await;
    assert!(wait_until(Duration::from_secs(2), || received.lock().len() == 2).await);
    received.lock().clear();

    // The registry dropped our own advertisement.
    system.remoting_root().unwrap().tell(RegistryGateRemoved {
        system_id: system.id().clone(),
        channel_id: channel_id.clone(),
    });

    assert!(
        wait_until(Duration::from_secs(2), || {
            received.lock().as_slice() == [format!("publish:{channel_id}")]
        })
        .await,
        "republish fan-out saw {:?}",
        received.lock().clone()
    );

    system.shutdown().await.unwrap();
}

// ============================================================================
// Spurious traffic does not disturb the control plane
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_spurious_message_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let (system, channel_id) = journal_system("spurious", dir.path()).await;
    let remoting_root = system.remoting_root().unwrap();

    remoting_root.tell("not a registry message".to_string());

    // The root keeps serving registry traffic afterwards.
    let peer = ReActorSystemId::new("node-c");
    remoting_root.tell(RegistryGateUpserted {
        system_id: peer.clone(),
        channel_id: channel_id.clone(),
        channel_data: ChannelProperties::new(),
    });
    assert!(
        wait_until(Duration::from_secs(2), || {
            system.find_gate(&peer, &channel_id).is_some()
        })
        .await
    );

    system.shutdown().await.unwrap();
}
