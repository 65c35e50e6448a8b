//! Multi-observer completion signal.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::sync::watch;

// Layer 3: Internal module imports
// (none)

/// One-shot completion observable by any number of waiters.
///
/// Used for hierarchy termination: every clone observes the same signal,
/// waiting is idempotent, and completing more than once is harmless.
///
/// # Example
/// ```rust
/// use reactor_rt::util::Completion;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let completion = Completion::new();
/// let observer = completion.clone();
///
/// assert!(!observer.is_complete());
/// completion.complete();
/// observer.wait().await;
/// assert!(observer.is_complete());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Completion {
    signal: Arc<watch::Sender<bool>>,
}

impl Completion {
    /// Create a fresh, not yet completed signal.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            signal: Arc::new(tx),
        }
    }

    /// Mark the completion as done, waking every waiter.
    pub fn complete(&self) {
        self.signal.send_replace(true);
    }

    /// Whether the completion already fired.
    pub fn is_complete(&self) -> bool {
        *self.signal.borrow()
    }

    /// Wait until the completion fires. Returns immediately if it already has.
    pub async fn wait(&self) {
        let mut rx = self.signal.subscribe();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completion_wait_after_complete() {
        let completion = Completion::new();
        completion.complete();

        completion.wait().await;
        assert!(completion.is_complete());
    }

    #[tokio::test]
    async fn test_completion_wakes_concurrent_waiters() {
        let completion = Completion::new();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let c = completion.clone();
                tokio::spawn(async move { c.wait().await })
            })
            .collect();

        completion.complete();
        for waiter in waiters {
            assert!(waiter.await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_completion_double_complete_is_harmless() {
        let completion = Completion::new();
        completion.complete();
        completion.complete();

        completion.wait().await;
    }
}
