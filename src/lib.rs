//! # reactor-rt - Location-Transparent Reactor Runtime
//!
//! A runtime in which isolated entities ("reactors") communicate
//! exclusively by asynchronous message passing, are cooperatively
//! scheduled over a pool of workers, and are transparently addressable
//! across process boundaries via pluggable transport drivers sharing a
//! service registry.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use reactor_rt::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SystemError> {
//!     // 1. Construct the system
//!     let system = ReActorSystem::new(ReActorSystemConfig::named("node-a")).await?;
//!
//!     // 2. Spawn a reactor with a reaction table
//!     let echo = system
//!         .spawn(
//!             ReActorConfig::named("echo"),
//!             ReActions::new().on::<String, _, _>(|ctx, text| async move {
//!                 ctx.reply(text.to_uppercase());
//!             }),
//!         )
//!         .await?;
//!
//!     // 3. Send through the reference; never to the reactor directly
//!     let status = echo.atell("hi".to_string(), AckingPolicy::SenderRequired).await;
//!     assert!(status.is_delivered());
//!
//!     system.shutdown().await
//! }
//! ```
//!
//! # Core Model
//!
//! - **Reactors** own a mailbox, a reaction table and a child hierarchy;
//!   their handlers run strictly one at a time.
//! - **References** ([`reactor::ReActorRef`]) are the only send surface;
//!   they resolve a destination channel to a driver, locally or remotely.
//! - **The dispatcher** drains mailboxes in bounded batches on
//!   worker-affine queues; a scheduling flag guarantees at most one
//!   worker per reactor.
//! - **Drivers** ([`driver::ReActorSystemDriver`]) own one channel each.
//!   The journal-backed local driver persists every envelope and feeds
//!   the dispatcher from a tail loop, making in-process ordering durable
//!   and observable.
//! - **The remoting root** publishes local channels to registry drivers,
//!   ingests peer gates and maintains the routing table.
//!
//! # Delivery Semantics
//!
//! Per (sender, receiver, channel) triple delivery is strict FIFO; per
//! receiver across senders, mailbox arrival order; across channels or
//! systems there is no ordering guarantee. Send outcomes are values
//! ([`message::DeliveryStatus`]) resolved through receipts, never
//! exceptions in the sender.
//!
//! # Module Organization
//!
//! - [`reactor`] - references, contexts, reaction tables, spawn config
//! - [`message`] - payload model, envelopes, receipts, wire codec
//! - [`mailbox`] - unbounded, bounded and priority queues
//! - [`dispatcher`] - the worker pool
//! - [`driver`] - the channel driver contract plus the direct and
//!   journal drivers
//! - [`journal`] - the append-only channel journal
//! - [`remoting`] - registry wire messages, remoting root, routing table
//! - [`system`] - system construction, configuration and teardown
//! - [`util`] - ids, backoff, completions

pub mod dispatcher;
pub mod driver;
pub mod journal;
pub mod mailbox;
pub mod message;
pub mod prelude;
pub mod reactor;
pub mod remoting;
pub mod system;
pub mod util;

// Re-export commonly used types
pub use driver::{
    ChannelProperties, DirectCommunicationDriver, DriverError, JournalDriver, JournalDriverConfig,
    ReActorSystemDriver,
};
pub use mailbox::{BackpressureStrategy, Mailbox};
pub use message::{
    AckingPolicy, DeadMessage, DeliveryReceipt, DeliveryStatus, Message, PayloadCodec,
    ReActorInit, ReActorPayload, ReActorStop,
};
pub use reactor::{
    MailboxConfig, ReActions, ReActorConfig, ReActorContext, ReActorRef, SubscriptionRule,
};
pub use system::{ReActorSystem, ReActorSystemConfig, SystemError};
pub use util::{ChannelId, ChannelType, Completion, ReActorId, ReActorSystemId};
