//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reactor_rt::prelude::*;
use reactor_rt::reactor::ReActorContext;
use tokio::time::sleep;

/// Poll `cond` every few milliseconds until it holds or `deadline` passes.
pub async fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// Start a system with a short shutdown timeout and a small worker pool.
pub async fn start_system(name: &str) -> ReActorSystem {
    let config = ReActorSystemConfig::builder(name)
        .with_worker_count(2)
        .with_shutdown_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    ReActorSystem::new(config).await.unwrap()
}

/// Spawn a reactor that appends every payload of type `T` it receives to
/// a shared vector.
pub async fn spawn_collector<T>(
    system: &ReActorSystem,
    name: &str,
) -> (ReActorRef, Arc<Mutex<Vec<T>>>)
where
    T: Clone + ReActorPayload,
{
    let sink: Arc<Mutex<Vec<T>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&sink);
    let reference = system
        .spawn(
            ReActorConfig::named(name),
            ReActions::new().on::<T, _, _>(move |_ctx: Arc<ReActorContext>, payload: Arc<T>| {
                let captured = Arc::clone(&captured);
                async move {
                    captured.lock().push((*payload).clone());
                }
            }),
        )
        .await
        .unwrap();
    (reference, sink)
}
