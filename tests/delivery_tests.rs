//! Integration tests for delivery status, acks, dead letters and
//! backpressure.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{spawn_collector, start_system, wait_until};
use parking_lot::Mutex;
use reactor_rt::prelude::*;
use tokio::time::sleep;

// ============================================================================
// Dead letters
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unresolved_destination_goes_to_dead_letters() {
    let system = start_system("dead-letters").await;

    // Observe DeadMessage traffic passively through an intercept rule.
    let observed: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let observed = Arc::clone(&observed);
        system
            .spawn(
                ReActorConfig::named("observer")
                    .with_intercept_rules(vec![SubscriptionRule::matching::<DeadMessage>()]),
                ReActions::new().on::<DeadMessage, _, _>(move |_ctx, dead| {
                    let observed = Arc::clone(&observed);
                    async move {
                        let payload = dead
                            .payload_as::<String>()
                            .cloned()
                            .unwrap_or_default();
                        observed
                            .lock()
                            .push((dead.sender.id().name().to_string(), payload));
                    }
                }),
            )
            .await
            .unwrap();
    }

    let (sender, _) = spawn_collector::<String>(&system, "sender").await;
    let ghost = system.local_ref("nobody-home");
    let status = ghost
        .atell_from(&sender, "x".to_string(), AckingPolicy::SenderRequired)
        .await;

    assert_eq!(status, DeliveryStatus::NotDelivered);
    assert!(
        wait_until(Duration::from_secs(2), || system.dead_letter_count() == 1).await,
        "dead letter never arrived"
    );
    assert!(
        wait_until(Duration::from_secs(2), || {
            observed.lock().as_slice() == [("sender".to_string(), "x".to_string())]
        })
        .await,
        "intercept observer saw {:?}",
        observed.lock().clone()
    );

    system.shutdown().await.unwrap();
}

// ============================================================================
// Ack fidelity
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ack_resolves_delivered_for_live_destination() {
    let system = start_system("acks").await;
    let (collector, seen) = spawn_collector::<u64>(&system, "collector").await;

    let status = collector.atell(7u64, AckingPolicy::SenderRequired).await;
    assert_eq!(status, DeliveryStatus::Delivered);
    assert!(wait_until(Duration::from_secs(2), || seen.lock().len() == 1).await);

    system.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ack_resolves_not_delivered_after_termination() {
    let system = start_system("acks-dead").await;
    let (collector, _) = spawn_collector::<u64>(&system, "collector").await;

    system.stop_reactor(&collector).unwrap().wait().await;

    let status = collector.atell(7u64, AckingPolicy::SenderRequired).await;
    assert_eq!(status, DeliveryStatus::NotDelivered);

    system.shutdown().await.unwrap();
}

// ============================================================================
// Backpressure
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bounded_mailbox_backpressures_sender() {
    let system = start_system("backpressure").await;

    let slow = system
        .spawn(
            ReActorConfig::named("slow").with_mailbox(MailboxConfig::Bounded {
                capacity: 2,
                strategy: BackpressureStrategy::DropNewest,
            }),
            ReActions::new().on::<u64, _, _>(|_ctx, _n| async move {
                sleep(Duration::from_millis(200)).await;
            }),
        )
        .await
        .unwrap();

    // First message occupies the worker; let it get picked up.
    slow.atell(0u64, AckingPolicy::SenderRequired).await;
    sleep(Duration::from_millis(50)).await;

    let mut statuses = Vec::new();
    for n in 1..=4u64 {
        statuses.push(slow.atell(n, AckingPolicy::SenderRequired).await);
    }

    assert!(
        statuses.contains(&DeliveryStatus::Backpressured),
        "expected at least one backpressured send, got {statuses:?}"
    );

    system.shutdown().await.unwrap();
}

// ============================================================================
// Handler failure isolation
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handler_panic_does_not_stop_the_reactor() {
    let system = start_system("panics").await;

    let survived: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let reference = {
        let survived = Arc::clone(&survived);
        system
            .spawn(
                ReActorConfig::named("fragile"),
                ReActions::new().on::<u64, _, _>(move |_ctx, n| {
                    let survived = Arc::clone(&survived);
                    async move {
                        assert!(*n != 1, "poisoned message");
                        survived.lock().push(*n);
                    }
                }),
            )
            .await
            .unwrap()
    };

    reference.tell(0u64);
    reference.tell(1u64); // Panics inside the handler
    reference.tell(2u64);

    assert!(
        wait_until(Duration::from_secs(2), || {
            survived.lock().as_slice() == [0, 2]
        })
        .await,
        "reactor did not survive the panic: {:?}",
        survived.lock().clone()
    );

    system.shutdown().await.unwrap();
}
