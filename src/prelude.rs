//! Convenience re-exports for the common surface of the runtime.
//!
//! ```rust
//! use reactor_rt::prelude::*;
//! ```

pub use crate::driver::{
    ChannelProperties, DirectCommunicationDriver, DriverError, JournalDriver,
    JournalDriverConfig, ReActorSystemDriver,
};
pub use crate::mailbox::BackpressureStrategy;
pub use crate::message::{
    AckingPolicy, DeadMessage, DeliveryStatus, ReActorInit, ReActorPayload, ReActorStop,
};
pub use crate::reactor::{
    MailboxConfig, ReActions, ReActorConfig, ReActorRef, SubscriptionRule,
};
pub use crate::system::{ReActorSystem, ReActorSystemConfig, SystemError};
pub use crate::util::{ChannelId, ChannelType, ReActorId, ReActorSystemId};
