//! Reactor model: references, per-reactor runtime state, reaction tables.
//!
//! # Components
//!
//! - [`ReActorRef`] - location-transparent handle all sends go through
//! - [`ReActorContext`] - per-reactor runtime record owned by the system
//! - [`ReActions`] - payload-type to handler mapping with a wildcard
//! - [`ReActorConfig`] / [`MailboxConfig`] - spawn-time configuration
//! - [`ReActorLifecycle`] / [`ReActorState`] - lifecycle state machine
//!
//! A reactor is an isolated entity: its only interaction surface is the
//! mailbox behind its reference, and its handlers run strictly one at a
//! time under the owning context's scheduling flag.

pub mod config;
pub mod context;
pub mod lifecycle;
pub mod reactions;
pub mod refs;

pub use config::{MailboxConfig, ReActorConfig};
pub use context::{ReActorContext, SubscriptionRule};
pub use lifecycle::{ReActorLifecycle, ReActorState};
pub use reactions::ReActions;
pub use refs::ReActorRef;
