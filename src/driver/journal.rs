//! Journal-backed local channel driver.

// Layer 1: Standard library imports
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{error, warn};

// Layer 3: Internal module imports
use super::error::DriverError;
use super::offer_message;
use super::traits::{ChannelProperties, DriverCtx, ReActorSystemDriver};
use crate::journal::{Journal, JournalTailer};
use crate::message::{DeliveryStatus, Message, WireMessage};
use crate::reactor::ReActorRef;
use crate::system::ReActorSystem;
use crate::util::backoff::{DEFAULT_BACKOFF_CEILING, DEFAULT_BACKOFF_FLOOR};
use crate::util::{BackoffPauser, ChannelId, ChannelType};

/// Configuration of one journal channel.
#[derive(Debug, Clone)]
pub struct JournalDriverConfig {
    channel_name: String,
    directory: PathBuf,
    durable: bool,
    backoff_floor: Duration,
    backoff_ceiling: Duration,
}

impl JournalDriverConfig {
    /// Configuration for `channel_name` journaling under `directory`.
    pub fn new(channel_name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            channel_name: channel_name.into(),
            directory: directory.into(),
            durable: false,
            backoff_floor: DEFAULT_BACKOFF_FLOOR,
            backoff_ceiling: DEFAULT_BACKOFF_CEILING,
        }
    }

    /// Fsync every append.
    pub fn with_durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    /// Tune the idle backoff of the tail loop.
    pub fn with_backoff(mut self, floor: Duration, ceiling: Duration) -> Self {
        self.backoff_floor = floor;
        self.backoff_ceiling = ceiling;
        self
    }

    /// Channel instance name.
    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Where the journal file for this channel lives.
    pub fn journal_path(&self) -> PathBuf {
        Journal::file_path(&self.directory, &self.channel_name)
    }
}

/// Local driver whose channel is a persistent append-only journal.
///
/// Egress appends the wire-encoded envelope; a dedicated tailer thread
/// reads records back in append order and offers them to the system. The
/// journal thereby reifies the ordering of co-located reactors, survives
/// restarts, and is observable by external tools without a network hop.
///
/// The tailer starts at the current end of the journal: records predating
/// driver start are never replayed.
pub struct JournalDriver {
    channel_id: ChannelId,
    properties: ChannelProperties,
    config: JournalDriverConfig,
    ctx: DriverCtx,
    journal: OnceLock<Arc<Journal>>,
    shutdown: Arc<AtomicBool>,
    tail_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl JournalDriver {
    /// Create a driver from its channel configuration.
    pub fn new(config: JournalDriverConfig) -> Self {
        let channel_id = ChannelId::new(ChannelType::LocalJournal, config.channel_name.clone());
        let properties = ChannelProperties::new()
            .with("durable", config.durable.to_string())
            .with("directory", config.directory.display().to_string());
        Self {
            channel_id,
            properties,
            config,
            ctx: DriverCtx::new(),
            journal: OnceLock::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            tail_thread: Mutex::new(None),
        }
    }

    /// The backing journal, once initialized.
    pub fn journal(&self) -> Option<&Arc<Journal>> {
        self.journal.get()
    }

    /// Tail loop body, run on the dedicated ingress thread.
    fn tail_loop(
        driver: Arc<JournalDriver>,
        mut tailer: JournalTailer,
        shutdown: Arc<AtomicBool>,
        mut backoff: BackoffPauser,
    ) {
        while !shutdown.load(Ordering::Acquire) {
            match tailer.read_next() {
                Ok(Some(record)) => {
                    backoff.reset();
                    Self::ingest(&driver, &record);
                }
                Ok(None) => backoff.pause(),
                Err(err) => {
                    // A corrupt frame header cannot be skipped: the tailer
                    // has no resynchronization point past it.
                    error!(
                        channel = %driver.channel_id,
                        error = %err,
                        "journal tailer failed; channel ingress stopped"
                    );
                    break;
                }
            }
        }
    }

    /// Decode one record and offer it to the system. Decode failures are
    /// logged and dropped; the tailer has already advanced past the
    /// record.
    fn ingest(driver: &Arc<JournalDriver>, record: &[u8]) {
        let Some(system) = driver.ctx.system() else {
            return;
        };
        let decoded = WireMessage::decode(record)
            .and_then(|wire| wire.into_message(system.codec()));
        match decoded {
            Ok(mut msg) => {
                if msg.destination().system_id() != system.id() {
                    warn!(
                        channel = %driver.channel_id,
                        destination_system = %msg.destination().system_id(),
                        "record addressed to a foreign system; dropped"
                    );
                    return;
                }
                let as_dyn: Arc<dyn ReActorSystemDriver> = Arc::clone(driver) as Arc<dyn ReActorSystemDriver>;
                msg.bind_source(&as_dyn);
                offer_message(driver.as_ref(), msg);
            }
            Err(err) => warn!(
                channel = %driver.channel_id,
                error = %err,
                "malformed journal record skipped"
            ),
        }
    }
}

#[async_trait]
impl ReActorSystemDriver for JournalDriver {
    fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    fn channel_properties(&self) -> &ChannelProperties {
        &self.properties
    }

    fn channel_requires_delivery_ack(&self) -> bool {
        false
    }

    fn driver_ctx(&self) -> &DriverCtx {
        &self.ctx
    }

    async fn init_driver_loop(self: Arc<Self>, system: ReActorSystem) -> Result<(), DriverError> {
        self.ctx.attach(system)?;

        let journal = Arc::new(Journal::open(
            &self.config.directory,
            &self.config.channel_name,
            self.config.durable,
        )?);
        let tailer = journal.tailer()?;
        self.journal
            .set(journal)
            .map_err(|_| DriverError::AlreadyInitialized)?;

        let driver = Arc::clone(&self);
        let shutdown = Arc::clone(&self.shutdown);
        let backoff = BackoffPauser::new(self.config.backoff_floor, self.config.backoff_ceiling);
        let handle = thread::Builder::new()
            .name(format!("journal-tail-{}", self.config.channel_name))
            .spawn(move || Self::tail_loop(driver, tailer, shutdown, backoff))
            .map_err(|err| DriverError::ChannelInit {
                channel: self.channel_id.clone(),
                reason: err.to_string(),
            })?;
        *self.tail_thread.lock() = Some(handle);
        Ok(())
    }

    async fn clean_driver_loop(&self) -> Result<(), DriverError> {
        self.shutdown.store(true, Ordering::Release);
        let handle = self.tail_thread.lock().take();
        if let Some(handle) = handle {
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
        }
        self.ctx.acks().drain(DeliveryStatus::NotDelivered);
        Ok(())
    }

    fn send_message(&self, _destination: &ReActorRef, msg: Message) -> DeliveryStatus {
        let Some(system) = self.ctx.system() else {
            return DeliveryStatus::NotDelivered;
        };
        let Some(journal) = self.journal.get() else {
            error!(channel = %self.channel_id, "send on uninitialized journal driver");
            return DeliveryStatus::NotDelivered;
        };
        let appended = WireMessage::encode(&msg, system.codec())
            .map_err(DriverError::from)
            .and_then(|record| journal.append(&record).map_err(DriverError::from));
        match appended {
            // Appended: the actual delivery status is observed by the tail
            // loop and settles any pending ack.
            Ok(_) => DeliveryStatus::Delivered,
            Err(err) => {
                error!(
                    channel = %self.channel_id,
                    sequence = msg.sequence(),
                    payload = msg.payload_tag(),
                    error = %err,
                    "journal append failed"
                );
                DeliveryStatus::NotDelivered
            }
        }
    }
}

impl std::fmt::Debug for JournalDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalDriver")
            .field("channel_id", &self.channel_id.to_string())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths_and_properties() {
        let config = JournalDriverConfig::new("main", "/tmp/journals").with_durable(true);
        assert_eq!(config.channel_name(), "main");
        assert!(config.journal_path().ends_with("main.journal"));

        let driver = JournalDriver::new(config);
        assert_eq!(driver.channel_properties().get("durable"), Some("true"));
        assert_eq!(
            driver.channel_id().channel_type(),
            &ChannelType::LocalJournal
        );
    }

    #[test]
    fn test_send_before_init_is_not_delivered() {
        let driver = JournalDriver::new(JournalDriverConfig::new("cold", "/tmp/journals"));
        let reference = ReActorRef::new(
            crate::util::ReActorId::new("x"),
            crate::util::ReActorSystemId::new("test"),
            driver.channel_id().clone(),
        );
        let msg = Message::new(
            1,
            reference.clone(),
            reference.clone(),
            crate::message::AckingPolicy::None,
            Arc::new(1u64),
        );

        assert_eq!(
            driver.send_message(&reference, msg),
            DeliveryStatus::NotDelivered
        );
    }
}
