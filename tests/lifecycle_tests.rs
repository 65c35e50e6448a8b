//! Integration tests for spawn, reaction dispatch and hierarchy stop.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{spawn_collector, start_system, wait_until};
use reactor_rt::prelude::*;
use tokio::time::sleep;

// ============================================================================
// Hello: reply flows back to the sender
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hello_reply_uppercases() {
    let system = start_system("hello").await;

    let upper = system
        .spawn(
            ReActorConfig::named("p"),
            ReActions::new().on::<String, _, _>(|ctx, text| async move {
                ctx.reply(text.to_uppercase());
            }),
        )
        .await
        .unwrap();

    let (probe, replies) = spawn_collector::<String>(&system, "probe").await;
    upper.tell_from(&probe, "hi".to_string());

    assert!(
        wait_until(Duration::from_secs(2), || {
            replies.lock().as_slice() == ["HI".to_string()]
        })
        .await
    );

    system.shutdown().await.unwrap();
}

// ============================================================================
// Per-sender FIFO
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_per_sender_fifo() {
    let system = start_system("fifo").await;
    let (collector, seen) = spawn_collector::<u64>(&system, "collector").await;
    let (sender, _) = spawn_collector::<u64>(&system, "sender").await;

    for n in 0..200u64 {
        collector.tell_from(&sender, n);
    }

    assert!(
        wait_until(Duration::from_secs(5), || seen.lock().len() == 200).await,
        "collector received {} of 200",
        seen.lock().len()
    );
    let received = seen.lock().clone();
    let expected: Vec<u64> = (0..200).collect();
    assert_eq!(received, expected);

    system.shutdown().await.unwrap();
}

// ============================================================================
// Single-consumer handler linearity
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_handler_invocations_never_overlap() {
    let system = start_system("linear").await;

    let in_handler = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let processed = Arc::new(AtomicU64::new(0));

    let reference = {
        let in_handler = Arc::clone(&in_handler);
        let overlaps = Arc::clone(&overlaps);
        let processed = Arc::clone(&processed);
        system
            .spawn(
                ReActorConfig::named("serial"),
                ReActions::new().on::<u64, _, _>(move |_ctx, _n| {
                    let in_handler = Arc::clone(&in_handler);
                    let overlaps = Arc::clone(&overlaps);
                    let processed = Arc::clone(&processed);
                    async move {
                        if in_handler.swap(true, Ordering::SeqCst) {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        tokio::task::yield_now().await;
                        in_handler.store(false, Ordering::SeqCst);
                        processed.fetch_add(1, Ordering::SeqCst);
                    }
                }),
            )
            .await
            .unwrap()
    };

    // Concurrent senders from several tasks.
    let mut senders = Vec::new();
    for _ in 0..4 {
        let reference = reference.clone();
        senders.push(tokio::spawn(async move {
            for n in 0..50u64 {
                reference.tell(n);
            }
        }));
    }
    for sender in senders {
        sender.await.unwrap();
    }

    assert!(
        wait_until(Duration::from_secs(5), || {
            processed.load(Ordering::SeqCst) == 200
        })
        .await
    );
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);

    system.shutdown().await.unwrap();
}

// ============================================================================
// Parent-child stop
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parent_stop_waits_for_children() {
    let system = start_system("family").await;

    let child_stops = Arc::new(AtomicUsize::new(0));
    let children_ready = Arc::new(AtomicUsize::new(0));

    let parent = {
        let child_stops = Arc::clone(&child_stops);
        let children_ready = Arc::clone(&children_ready);
        system
            .spawn(
                ReActorConfig::named("parent"),
                ReActions::new().on::<ReActorInit, _, _>(move |ctx, _init| {
                    let child_stops = Arc::clone(&child_stops);
                    let children_ready = Arc::clone(&children_ready);
                    async move {
                        for n in 0..3 {
                            let child_stops = Arc::clone(&child_stops);
                            let children_ready = Arc::clone(&children_ready);
                            ctx.spawn_child(
                                ReActorConfig::named(format!("child-{n}")),
                                ReActions::new()
                                    .on::<ReActorInit, _, _>(move |_ctx, _init| {
                                        let children_ready = Arc::clone(&children_ready);
                                        async move {
                                            sleep(Duration::from_millis(10)).await;
                                            children_ready.fetch_add(1, Ordering::SeqCst);
                                        }
                                    })
                                    .on::<ReActorStop, _, _>(move |_ctx, _stop| {
                                        let child_stops = Arc::clone(&child_stops);
                                        async move {
                                            child_stops.fetch_add(1, Ordering::SeqCst);
                                        }
                                    }),
                            )
                            .await
                            .unwrap();
                        }
                    }
                }),
            )
            .await
            .unwrap()
    };

    assert!(
        wait_until(Duration::from_secs(2), || {
            children_ready.load(Ordering::SeqCst) == 3
        })
        .await
    );

    let termination = system.stop_reactor(&parent).unwrap();
    tokio::time::timeout(Duration::from_secs(5), termination.wait())
        .await
        .expect("hierarchy termination timed out");

    // Each child observed exactly one terminal message before the
    // completion fired.
    assert_eq!(child_stops.load(Ordering::SeqCst), 3);

    system.shutdown().await.unwrap();
}

// ============================================================================
// Identity invariants
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_duplicate_reactor_name_rejected() {
    let system = start_system("dupes").await;

    system
        .spawn(ReActorConfig::named("solo"), ReActions::new())
        .await
        .unwrap();
    let duplicate = system
        .spawn(ReActorConfig::named("solo"), ReActions::new())
        .await;

    assert!(matches!(
        duplicate,
        Err(SystemError::DuplicateReActorId(_))
    ));

    system.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stopped_reactor_frees_its_name() {
    let system = start_system("respawn").await;

    let first = system
        .spawn(ReActorConfig::named("phoenix"), ReActions::new())
        .await
        .unwrap();
    system.stop_reactor(&first).unwrap().wait().await;

    let second = system
        .spawn(ReActorConfig::named("phoenix"), ReActions::new())
        .await;
    assert!(second.is_ok());

    system.shutdown().await.unwrap();
}
