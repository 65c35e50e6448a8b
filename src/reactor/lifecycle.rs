//! Reactor lifecycle state machine.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
// (none)

/// Reactor state in the lifecycle state machine.
///
/// # State Transitions
///
/// ```text
/// Spawned -- ReActorInit --> Running -- stop() --> Stopping
/// Stopping -- children done + ReActorStop drained --> Terminated
/// ```
///
/// Transitions are observable only from within the owning worker; external
/// observers use the hierarchy-termination completion instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReActorState {
    /// Registered but the init message has not been processed yet.
    Spawned,
    /// Processing mailbox messages.
    Running,
    /// Stop flag observed; draining and waiting for children.
    Stopping,
    /// Unregistered; the hierarchy completion has fired.
    Terminated,
}

impl Default for ReActorState {
    fn default() -> Self {
        Self::Spawned
    }
}

/// Lifecycle tracker recording the current state and when it was entered.
#[derive(Debug, Clone)]
pub struct ReActorLifecycle {
    state: ReActorState,
    last_transition: DateTime<Utc>,
}

impl ReActorLifecycle {
    /// Create a tracker in [`ReActorState::Spawned`].
    pub fn new() -> Self {
        Self {
            state: ReActorState::Spawned,
            last_transition: Utc::now(),
        }
    }

    /// Move to `state`, recording the transition time.
    pub fn transition_to(&mut self, state: ReActorState) {
        self.state = state;
        self.last_transition = Utc::now();
    }

    /// Current state.
    pub fn state(&self) -> ReActorState {
        self.state
    }

    /// When the current state was entered.
    pub fn last_transition(&self) -> DateTime<Utc> {
        self.last_transition
    }
}

impl Default for ReActorLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
