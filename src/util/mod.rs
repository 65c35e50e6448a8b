//! Shared utilities for the reactor runtime.
//!
//! - [`ReActorId`], [`ReActorSystemId`], [`ChannelId`] - identity newtypes
//! - [`BackoffPauser`] - bounded exponential idle backoff for driver loops
//! - [`Completion`] - multi-observer one-shot completion signal

pub mod backoff;
pub mod completion;
pub mod ids;

pub use backoff::BackoffPauser;
pub use completion::Completion;
pub use ids::{ChannelId, ChannelType, ReActorId, ReActorSystemId};
