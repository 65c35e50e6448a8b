//! Spawn-time reactor configuration.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::context::SubscriptionRule;
use crate::mailbox::{
    BackpressureStrategy, BoundedMailbox, Mailbox, PriorityClassifier, PriorityMailbox,
    UnboundedMailbox,
};

/// Which mailbox variant backs the reactor.
pub enum MailboxConfig {
    /// [`UnboundedMailbox`].
    Unbounded,
    /// [`BoundedMailbox`] with an explicit capacity, or the system default
    /// capacity when `capacity` is zero.
    Bounded {
        /// Maximum queued messages; 0 means the system default.
        capacity: usize,
        /// What to do at capacity.
        strategy: BackpressureStrategy,
    },
    /// [`PriorityMailbox`] with a custom classifier.
    Priority(PriorityClassifier),
    /// [`PriorityMailbox`] ranking lifecycle messages first.
    LifecycleFirst,
}

impl MailboxConfig {
    pub(crate) fn build(self, default_capacity: usize) -> Box<dyn Mailbox> {
        match self {
            Self::Unbounded => Box::new(UnboundedMailbox::new()),
            Self::Bounded { capacity, strategy } => {
                let capacity = if capacity == 0 { default_capacity } else { capacity };
                Box::new(BoundedMailbox::new(capacity, strategy))
            }
            Self::Priority(classifier) => Box::new(PriorityMailbox::new(classifier)),
            Self::LifecycleFirst => Box::new(PriorityMailbox::lifecycle_first()),
        }
    }
}

impl fmt::Debug for MailboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "Unbounded"),
            Self::Bounded { capacity, strategy } => f
                .debug_struct("Bounded")
                .field("capacity", capacity)
                .field("strategy", strategy)
                .finish(),
            Self::Priority(_) => write!(f, "Priority(..)"),
            Self::LifecycleFirst => write!(f, "LifecycleFirst"),
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self::Unbounded
    }
}

/// Configuration for one reactor, consumed by spawn.
///
/// # Example
/// ```rust
/// use reactor_rt::mailbox::BackpressureStrategy;
/// use reactor_rt::reactor::{MailboxConfig, ReActorConfig, SubscriptionRule};
///
/// let config = ReActorConfig::named("uppercase")
///     .with_mailbox(MailboxConfig::Bounded {
///         capacity: 128,
///         strategy: BackpressureStrategy::DropNewest,
///     })
///     .with_intercept_rules(vec![SubscriptionRule::matching::<String>()]);
/// assert_eq!(config.name(), "uppercase");
/// ```
#[derive(Debug)]
pub struct ReActorConfig {
    name: String,
    mailbox: MailboxConfig,
    intercept_rules: Vec<SubscriptionRule>,
}

impl ReActorConfig {
    /// Configuration with the given reactor name and defaults otherwise.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mailbox: MailboxConfig::default(),
            intercept_rules: Vec::new(),
        }
    }

    /// Choose the mailbox variant.
    pub fn with_mailbox(mut self, mailbox: MailboxConfig) -> Self {
        self.mailbox = mailbox;
        self
    }

    /// Declare intercept rules installed before the init message runs.
    pub fn with_intercept_rules(mut self, rules: Vec<SubscriptionRule>) -> Self {
        self.intercept_rules = rules;
        self
    }

    /// The reactor name; must be unique within the system.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, MailboxConfig, Vec<SubscriptionRule>) {
        (self.name, self.mailbox, self.intercept_rules)
    }
}
