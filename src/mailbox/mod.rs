//! Per-reactor message queues.
//!
//! A mailbox is an ordered, single-consumer queue of envelopes for one
//! reactor. The dispatcher drains it in bounded batches through the
//! [`Mailbox`] trait and never cares which variant backs it:
//!
//! - [`UnboundedMailbox`] - no capacity limit
//! - [`BoundedMailbox`] - fixed capacity with a [`BackpressureStrategy`]
//! - [`PriorityMailbox`] - drains by [`MessagePriority`](crate::message::MessagePriority),
//!   arrival order within a priority class
//!
//! FIFO within a single sender is guaranteed by every variant; across
//! senders, arrival order is the tiebreak.

pub mod backpressure;
pub mod bounded;
pub mod priority;
pub mod traits;
pub mod unbounded;

pub use backpressure::BackpressureStrategy;
pub use bounded::BoundedMailbox;
pub use priority::{PriorityClassifier, PriorityMailbox};
pub use traits::Mailbox;
pub use unbounded::UnboundedMailbox;
