//! Cooperative scheduling of reactors onto a fixed worker pool.
//!
//! The dispatcher owns the worker tasks and the per-worker ready queues.
//! A context enters a queue only after its scheduling flag was acquired,
//! which makes repeated `reschedule` calls idempotent: exactly one worker
//! drains a given context at any time. Queues are worker-affine (hash of
//! the reactor id), so a reactor executes on a consistent worker over its
//! lifetime and its handlers are effectively single-threaded.

// Layer 1: Standard library imports
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error};

// Layer 3: Internal module imports
use crate::message::{Message, ReActorStop};
use crate::reactor::{ReActorContext, ReActorState};
use crate::util::{Completion, ReActorId};

type ReadyQueue = UnboundedSender<Arc<ReActorContext>>;

/// Schedules contexts with pending work onto worker tasks.
pub struct Dispatcher {
    workers: Vec<ReadyQueue>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    batch_size: usize,
}

impl Dispatcher {
    /// Start `worker_count` workers draining up to `batch_size` messages
    /// per scheduling cycle. Must run inside a tokio runtime.
    pub(crate) fn new(worker_count: usize, batch_size: usize) -> Arc<Self> {
        let worker_count = worker_count.max(1);
        let mut workers = Vec::with_capacity(worker_count);
        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let (tx, rx) = unbounded_channel();
            let requeue = tx.clone();
            handles.push(tokio::spawn(Self::worker_loop(rx, requeue, batch_size)));
            workers.push(tx);
        }
        Arc::new(Self {
            workers,
            handles: Mutex::new(handles),
            batch_size,
        })
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of workers.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Consider a context for execution.
    ///
    /// A failed scheduling-flag acquisition means another worker already
    /// owns the context and will observe the new mailbox contents before
    /// releasing; the call is then a no-op.
    pub(crate) fn dispatch(&self, ctx: &Arc<ReActorContext>) {
        if !ctx.acquire_scheduling() {
            return;
        }
        let index = Self::worker_index(ctx.id(), self.workers.len());
        if self.workers[index].send(Arc::clone(ctx)).is_err() {
            ctx.release_scheduling();
        }
    }

    /// Abort the worker tasks. Called once by system shutdown after the
    /// hierarchy has terminated.
    pub(crate) fn shutdown(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }

    fn worker_index(id: &ReActorId, workers: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        (hasher.finish() as usize) % workers
    }

    async fn worker_loop(
        mut ready: UnboundedReceiver<Arc<ReActorContext>>,
        requeue: ReadyQueue,
        batch_size: usize,
    ) {
        while let Some(ctx) = ready.recv().await {
            Self::run_context(ctx, &requeue, batch_size).await;
        }
    }

    /// Drain one scheduling cycle of a context. The caller owns the
    /// context's scheduling flag.
    async fn run_context(ctx: Arc<ReActorContext>, requeue: &ReadyQueue, batch_size: usize) {
        if !ctx.acquire_coherence() {
            error!(reactor = %ctx.id(), "recursive dispatch attempt detected");
            ctx.release_scheduling();
            return;
        }

        for msg in ctx.dequeue_batch(batch_size) {
            Self::execute(&ctx, msg).await;
        }

        if ctx.is_stop() && ctx.mailbox_is_empty() {
            ctx.release_coherence();
            // Termination waits on child hierarchies; run it off the
            // worker so siblings scheduled here keep draining. The
            // scheduling flag stays taken: the context is done executing
            // user messages forever.
            tokio::spawn(Self::terminate(ctx));
            return;
        }

        ctx.release_scheduling();
        // Loop-check after release: a deliver or a stop() whose dispatch
        // lost the flag race would otherwise be a lost wakeup.
        if (!ctx.mailbox_is_empty() || ctx.is_stop()) && ctx.acquire_scheduling() {
            // Re-enqueue at the back of the affine queue instead of
            // looping: contexts sharing the worker get their turn.
            if requeue.send(Arc::clone(&ctx)).is_err() {
                ctx.release_scheduling();
            }
        }
        ctx.release_coherence();
    }

    /// Run one message, converting handler panics into log lines. The
    /// reactor is neither stopped nor is the message re-queued.
    async fn execute(ctx: &Arc<ReActorContext>, msg: Message) {
        let payload_tag = msg.payload_tag();
        let outcome = AssertUnwindSafe(Arc::clone(ctx).re_act(msg))
            .catch_unwind()
            .await;
        if let Err(panic) = outcome {
            error!(
                reactor = %ctx.id(),
                payload = payload_tag,
                panic = panic_text(panic.as_ref()),
                "reaction handler panicked"
            );
        }
    }

    /// Stop the child hierarchy, drain the terminal message, unregister.
    async fn terminate(ctx: Arc<ReActorContext>) {
        ctx.set_state(ReActorState::Stopping);

        let system = ctx.system().clone();
        let completions: Vec<Completion> = ctx
            .children()
            .iter()
            .filter_map(|child| system.context_by_id(child.id()))
            .map(|child_ctx| child_ctx.stop())
            .collect();
        for completion in completions {
            completion.wait().await;
        }

        let stop_msg = system.synthesize_message(
            ctx.self_ref().clone(),
            ctx.self_ref().clone(),
            ReActorStop,
        );
        Self::execute(&ctx, stop_msg).await;

        ctx.mark_terminated();
        system.unregister_context(&ctx);
        ctx.hierarchy_termination().complete();
        debug!(reactor = %ctx.id(), "reactor hierarchy terminated");
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.workers.len())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(text) = panic.downcast_ref::<&str>() {
        text
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ReActorId;

    #[test]
    fn test_worker_index_is_stable() {
        let id = ReActorId::new("affine");
        let first = Dispatcher::worker_index(&id, 4);
        for _ in 0..16 {
            assert_eq!(Dispatcher::worker_index(&id, 4), first);
        }
    }

    #[test]
    fn test_worker_index_in_range() {
        for name in ["a", "b", "c", "d", "e", "f"] {
            let idx = Dispatcher::worker_index(&ReActorId::new(name), 3);
            assert!(idx < 3);
        }
    }
}
