//! Flow-control strategies for bounded mailboxes.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
// (none)

/// What a bounded mailbox does when a message arrives at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressureStrategy {
    /// Refuse the new message; the sender observes `Backpressured`.
    DropNewest,

    /// Evict the oldest queued message and accept the new one.
    DropOldest,

    /// `async_deliver` waits for capacity; the synchronous path still
    /// answers `Backpressured` because it may never block.
    Block,
}

impl Default for BackpressureStrategy {
    fn default() -> Self {
        Self::DropNewest
    }
}
