//! The reactor system: registry of contexts, drivers and system reactors.
//!
//! Provides the main entry point of the runtime. A system is explicitly
//! constructed, passed around by cheap handle clones, and torn down in
//! reverse order of driver registration; there are no ambient singletons.

pub mod config;
pub mod errors;
pub mod reactor_system;

pub use config::{
    ReActorSystemConfig, ReActorSystemConfigBuilder, DEFAULT_DISPATCH_BATCH,
    DEFAULT_MAILBOX_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WORKER_COUNT,
};
pub use errors::SystemError;
pub use reactor_system::{ReActorSystem, DEAD_LETTERS_NAME, SYSTEM_ROOT_NAME};
