//! System configuration with sensible defaults.

// Layer 1: Standard library
use std::thread;
use std::time::Duration;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
// (none)

/// Default worker count; 0 resolves to the machine's parallelism.
pub const DEFAULT_WORKER_COUNT: usize = 0;

/// Default number of messages a worker drains per scheduling cycle.
pub const DEFAULT_DISPATCH_BATCH: usize = 16;

/// Default capacity for bounded mailboxes.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1000;

/// Default timeout for graceful system shutdown (30 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// System-wide configuration for the reactor runtime.
///
/// # Examples
///
/// ```rust
/// use reactor_rt::system::{ReActorSystemConfig, DEFAULT_DISPATCH_BATCH};
///
/// let config = ReActorSystemConfig::named("node-a");
/// assert_eq!(config.dispatch_batch, DEFAULT_DISPATCH_BATCH);
///
/// let config = ReActorSystemConfig::builder("node-a")
///     .with_worker_count(4)
///     .with_dispatch_batch(32)
///     .build()
///     .unwrap();
/// assert_eq!(config.worker_count, 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReActorSystemConfig {
    /// Human name of this system; carried in its system id.
    pub system_name: String,

    /// Dispatcher worker count (0 = machine parallelism).
    pub worker_count: usize,

    /// Messages drained per reactor per scheduling cycle.
    pub dispatch_batch: usize,

    /// Capacity used by bounded mailboxes that do not pick their own.
    pub default_mailbox_capacity: usize,

    /// Timeout for graceful system shutdown.
    pub shutdown_timeout: Duration,
}

impl ReActorSystemConfig {
    /// Configuration with the given system name and defaults otherwise.
    pub fn named(system_name: impl Into<String>) -> Self {
        Self {
            system_name: system_name.into(),
            worker_count: DEFAULT_WORKER_COUNT,
            dispatch_batch: DEFAULT_DISPATCH_BATCH,
            default_mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Create a configuration builder.
    pub fn builder(system_name: impl Into<String>) -> ReActorSystemConfigBuilder {
        ReActorSystemConfigBuilder {
            config: Self::named(system_name),
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.system_name.is_empty() {
            return Err("system_name must not be empty".to_string());
        }
        if self.dispatch_batch == 0 {
            return Err("dispatch_batch must be > 0".to_string());
        }
        if self.default_mailbox_capacity == 0 {
            return Err("default_mailbox_capacity must be > 0".to_string());
        }
        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be > 0".to_string());
        }
        Ok(())
    }

    /// Worker count with 0 resolved to the machine's parallelism.
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            return self.worker_count;
        }
        thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4)
    }
}

/// Builder for [`ReActorSystemConfig`] with a fluent API.
#[derive(Debug)]
pub struct ReActorSystemConfigBuilder {
    config: ReActorSystemConfig,
}

impl ReActorSystemConfigBuilder {
    /// Set the dispatcher worker count.
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.config.worker_count = workers;
        self
    }

    /// Set the per-cycle dispatch batch size.
    pub fn with_dispatch_batch(mut self, batch: usize) -> Self {
        self.config.dispatch_batch = batch;
        self
    }

    /// Set the default bounded-mailbox capacity.
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.default_mailbox_capacity = capacity;
        self
    }

    /// Set the graceful shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    /// Returns the first validation failure.
    pub fn build(self) -> Result<ReActorSystemConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}
