//! Main reactor system implementation.

// Layer 1: Standard library
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

// Layer 2: Third-party
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

// Layer 3: Internal
use super::config::ReActorSystemConfig;
use super::errors::SystemError;
use crate::dispatcher::Dispatcher;
use crate::driver::{ChannelProperties, DirectCommunicationDriver, ReActorSystemDriver};
use crate::message::{
    DeadMessage, Message, PayloadCodec, ReActorInit, ReActorPayload, ReActorStop,
};
use crate::reactor::{ReActions, ReActorConfig, ReActorContext, ReActorRef, SubscriptionRule};
use crate::remoting::messages::{
    ReActorSystemChannelIdPublicationRequest, RegistryDriverInitComplete, RegistryGateRemoved,
    RegistryGateUpserted, RegistryServicePublicationFailed, RegistrySubscriptionComplete,
    ServiceCancellationRequest, ServiceServicePublicationRequest,
    SynchronizationWithServiceRegistryRequest,
};
use crate::remoting::root::{remoting_root_reactions, REMOTING_ROOT_NAME};
use crate::remoting::routes::{Gate, RoutingTable};
use crate::util::{ChannelId, Completion, ReActorId, ReActorSystemId};

/// Name of the system root reactor; parent of every user spawn.
pub const SYSTEM_ROOT_NAME: &str = "root";

/// Name of the dead-letter reactor.
pub const DEAD_LETTERS_NAME: &str = "deadletters";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SystemState {
    Running,
    ShuttingDown,
    Stopped,
}

/// The reactor system: owner of every context, driver and system reactor.
///
/// A `ReActorSystem` is a cheap clonable handle; construct one, pass it
/// around, and tear it down with [`ReActorSystem::shutdown`]. On
/// construction the system starts the dispatcher, attaches the
/// direct-delivery driver, and spawns the root hierarchy: the system
/// root, the dead-letter reactor and the remoting root.
///
/// # Examples
///
/// ```rust,no_run
/// use reactor_rt::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), SystemError> {
///     let system = ReActorSystem::new(ReActorSystemConfig::named("node-a")).await?;
///
///     let echo = system
///         .spawn(
///             ReActorConfig::named("echo"),
///             ReActions::new().on::<String, _, _>(|ctx, text| async move {
///                 ctx.reply(text.to_uppercase());
///             }),
///         )
///         .await?;
///
///     echo.tell("hi".to_string());
///     system.shutdown().await
/// }
/// ```
#[derive(Clone)]
pub struct ReActorSystem {
    inner: Arc<SystemInner>,
}

struct SystemInner {
    config: ReActorSystemConfig,
    id: ReActorSystemId,
    contexts: DashMap<ReActorId, Arc<ReActorContext>>,
    drivers: RwLock<Vec<Arc<dyn ReActorSystemDriver>>>,
    direct: Arc<DirectCommunicationDriver>,
    routes: Arc<RoutingTable>,
    codec: Arc<PayloadCodec>,
    dispatcher: Arc<Dispatcher>,
    sequence: AtomicU64,
    subscriptions: DashMap<TypeId, Vec<ReActorRef>>,
    root_ref: OnceLock<ReActorRef>,
    deadletters_ref: OnceLock<ReActorRef>,
    remoting_root_ref: OnceLock<ReActorRef>,
    dead_letters: Arc<AtomicU64>,
    state: RwLock<SystemState>,
}

impl ReActorSystem {
    /// Construct a system and spawn its root hierarchy.
    ///
    /// Must run inside a tokio runtime: the dispatcher workers are
    /// spawned here.
    ///
    /// # Errors
    /// Configuration validation failures and direct-driver init failures.
    pub async fn new(config: ReActorSystemConfig) -> Result<Self, SystemError> {
        config.validate().map_err(SystemError::ConfigError)?;

        let id = ReActorSystemId::new(config.system_name.clone());
        let dispatcher = Dispatcher::new(config.resolved_worker_count(), config.dispatch_batch);
        let codec = Arc::new(PayloadCodec::new());
        register_builtin_payloads(&codec);

        let inner = Arc::new(SystemInner {
            config,
            id,
            contexts: DashMap::new(),
            drivers: RwLock::new(Vec::new()),
            direct: Arc::new(DirectCommunicationDriver::new()),
            routes: Arc::new(RoutingTable::new()),
            codec,
            dispatcher,
            sequence: AtomicU64::new(0),
            subscriptions: DashMap::new(),
            root_ref: OnceLock::new(),
            deadletters_ref: OnceLock::new(),
            remoting_root_ref: OnceLock::new(),
            dead_letters: Arc::new(AtomicU64::new(0)),
            state: RwLock::new(SystemState::Running),
        });
        let system = Self { inner };

        let direct = system.direct_driver();
        Arc::clone(&direct)
            .init_driver_loop(system.clone())
            .await?;
        system.inner.drivers.write().push(direct);

        let root = system.spawn_internal(None, ReActorConfig::named(SYSTEM_ROOT_NAME), root_reactions())?;
        let _ = system.inner.root_ref.set(root.clone());

        let deadletters = system.spawn_internal(
            Some(&root),
            ReActorConfig::named(DEAD_LETTERS_NAME),
            deadletters_reactions(Arc::clone(&system.inner.dead_letters)),
        )?;
        let _ = system.inner.deadletters_ref.set(deadletters);

        let remoting_root = system.spawn_internal(
            Some(&root),
            ReActorConfig::named(REMOTING_ROOT_NAME),
            remoting_root_reactions(),
        )?;
        let _ = system.inner.remoting_root_ref.set(remoting_root);

        info!(system = %system.inner.id, "reactor system started");
        Ok(system)
    }

    // --- identity and accessors ------------------------------------------

    /// This system's identity.
    pub fn id(&self) -> &ReActorSystemId {
        &self.inner.id
    }

    /// The system configuration.
    pub fn config(&self) -> &ReActorSystemConfig {
        &self.inner.config
    }

    /// The payload codec shared by every non-local channel.
    pub fn codec(&self) -> &PayloadCodec {
        &self.inner.codec
    }

    /// The dispatcher.
    pub(crate) fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }

    /// Number of live reactors, system reactors included.
    pub fn reactor_count(&self) -> usize {
        self.inner.contexts.len()
    }

    /// How many dead letters the system has seen.
    pub fn dead_letter_count(&self) -> u64 {
        self.inner.dead_letters.load(Ordering::Relaxed)
    }

    /// Reference of the dead-letter reactor.
    pub fn deadletters(&self) -> Option<ReActorRef> {
        self.inner.deadletters_ref.get().cloned()
    }

    /// Reference of the remoting root.
    pub fn remoting_root(&self) -> Option<ReActorRef> {
        self.inner.remoting_root_ref.get().cloned()
    }

    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        *self.inner.state.read() != SystemState::Running
    }

    /// Register payload type `T` for wire transport.
    pub fn register_payload<T>(&self)
    where
        T: serde::Serialize + serde::de::DeserializeOwned + fmt::Debug + Send + Sync + 'static,
    {
        self.inner.codec.register::<T>();
    }

    // --- spawning --------------------------------------------------------

    /// Spawn a reactor under the system root.
    ///
    /// # Errors
    /// Duplicate reactor names, empty names, or a system shutting down.
    pub async fn spawn(
        &self,
        config: ReActorConfig,
        reactions: ReActions,
    ) -> Result<ReActorRef, SystemError> {
        let root = self
            .inner
            .root_ref
            .get()
            .cloned()
            .ok_or_else(|| SystemError::SpawnFailed("system root missing".to_string()))?;
        self.spawn_internal(Some(&root), config, reactions)
    }

    /// Spawn a reactor as a child of `parent`.
    ///
    /// # Errors
    /// As [`ReActorSystem::spawn`], plus a terminated parent.
    pub async fn spawn_child(
        &self,
        parent: &ReActorRef,
        config: ReActorConfig,
        reactions: ReActions,
    ) -> Result<ReActorRef, SystemError> {
        self.spawn_internal(Some(parent), config, reactions)
    }

    fn spawn_internal(
        &self,
        parent: Option<&ReActorRef>,
        config: ReActorConfig,
        reactions: ReActions,
    ) -> Result<ReActorRef, SystemError> {
        if self.is_shutting_down() {
            return Err(SystemError::ShuttingDown);
        }
        let (name, mailbox_config, rules) = config.into_parts();
        if name.is_empty() {
            return Err(SystemError::SpawnFailed("reactor name must not be empty".to_string()));
        }

        let id = ReActorId::new(name);
        let direct = self.direct_driver();
        let mut self_ref = ReActorRef::new(
            id.clone(),
            self.inner.id.clone(),
            direct.channel_id().clone(),
        );
        self_ref.bind_driver(&direct);

        // The root is its own parent; everything else hangs off a live one.
        let parent_ref = parent.cloned().unwrap_or_else(|| self_ref.clone());

        let mailbox = mailbox_config.build(self.inner.config.default_mailbox_capacity);
        let ctx = ReActorContext::new(
            self.clone(),
            self_ref.clone(),
            parent_ref.clone(),
            mailbox,
            reactions,
            rules.clone(),
        );

        match self.inner.contexts.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                error!(reactor = %id, "duplicate reactor id rejected");
                return Err(SystemError::DuplicateReActorId(id));
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&ctx));
            }
        }

        if parent_ref.id() != &id {
            match self.context_by_id(parent_ref.id()) {
                Some(parent_ctx) => parent_ctx.add_child(self_ref.clone()),
                None => {
                    self.inner.contexts.remove(&id);
                    return Err(SystemError::SpawnFailed(format!(
                        "parent {} already terminated",
                        parent_ref.id()
                    )));
                }
            }
        }

        if !rules.is_empty() {
            self.reindex_subscriptions(&self_ref, &rules);
        }

        let init = self.synthesize_message(parent_ref, self_ref.clone(), ReActorInit);
        if ctx.deliver(init).is_delivered() {
            self.inner.dispatcher.dispatch(&ctx);
        }

        debug!(reactor = %id, "reactor spawned");
        Ok(self_ref)
    }

    /// Stop the reactor behind `reference`, returning its hierarchy
    /// termination completion.
    ///
    /// # Errors
    /// [`SystemError::ReActorNotFound`] when the reactor is unknown.
    pub fn stop_reactor(&self, reference: &ReActorRef) -> Result<Completion, SystemError> {
        self.context_by_id(reference.id())
            .map(|ctx| ctx.stop())
            .ok_or_else(|| SystemError::ReActorNotFound(reference.id().clone()))
    }

    // --- drivers and routing ---------------------------------------------

    /// Register and initialize a channel driver.
    ///
    /// # Errors
    /// Init failures are fatal for this driver only; the system and other
    /// channels keep operating.
    pub async fn register_driver(
        &self,
        driver: Arc<dyn ReActorSystemDriver>,
    ) -> Result<(), SystemError> {
        if self.is_shutting_down() {
            return Err(SystemError::ShuttingDown);
        }
        if let Err(err) = Arc::clone(&driver).init_driver_loop(self.clone()).await {
            error!(channel = %driver.channel_id(), error = %err, "driver init failed");
            return Err(err.into());
        }
        info!(channel = %driver.channel_id(), "channel driver registered");
        self.inner.drivers.write().push(driver);
        Ok(())
    }

    /// Every non-direct channel this system exposes.
    pub fn remote_channels(&self) -> Vec<(ChannelId, ChannelProperties)> {
        self.inner
            .drivers
            .read()
            .iter()
            .filter(|driver| {
                driver.channel_id().channel_type()
                    != self.inner.direct.channel_id().channel_type()
            })
            .map(|driver| (driver.channel_id().clone(), driver.channel_properties().clone()))
            .collect()
    }

    /// Resolve the gate for a peer channel.
    pub fn find_gate(&self, system_id: &ReActorSystemId, channel_id: &ChannelId) -> Option<Gate> {
        self.inner.routes.find_route(system_id, channel_id)
    }

    /// A direct-channel reference to a local reactor name.
    ///
    /// The name is not checked against the registry: sends to a name
    /// nobody registered resolve to the dead-letter reactor.
    pub fn local_ref(&self, reactor_name: &str) -> ReActorRef {
        let mut reference = ReActorRef::new(
            ReActorId::new(reactor_name),
            self.inner.id.clone(),
            self.inner.direct.channel_id().clone(),
        );
        reference.bind_driver(&self.direct_driver());
        reference
    }

    /// A reference to a reactor on a peer system, resolved through the
    /// routing table on every send so registry changes apply immediately.
    pub fn remote_ref(
        &self,
        peer: ReActorSystemId,
        channel_id: ChannelId,
        reactor_name: &str,
    ) -> ReActorRef {
        let mut reference = ReActorRef::new(ReActorId::new(reactor_name), peer, channel_id);
        reference.bind_routing(&self.inner.routes);
        reference
    }

    pub(crate) fn register_gate(
        &self,
        system_id: &ReActorSystemId,
        channel_id: &ChannelId,
        properties: ChannelProperties,
    ) {
        let driver = self.find_local_driver(channel_id);
        if driver.is_none() {
            warn!(
                peer = %system_id,
                channel = %channel_id,
                "gate registered without a matching local channel"
            );
        }
        self.inner.routes.register_route(Gate::new(
            system_id.clone(),
            channel_id.clone(),
            properties,
            driver.map(|d| Arc::downgrade(&d)),
        ));
    }

    pub(crate) fn unregister_gate(&self, system_id: &ReActorSystemId, channel_id: &ChannelId) {
        self.inner.routes.unregister_route(system_id, channel_id);
    }

    fn find_local_driver(&self, channel_id: &ChannelId) -> Option<Arc<dyn ReActorSystemDriver>> {
        let drivers = self.inner.drivers.read();
        drivers
            .iter()
            .find(|driver| driver.channel_id() == channel_id)
            .or_else(|| {
                drivers
                    .iter()
                    .find(|driver| driver.channel_id().channel_type() == channel_id.channel_type())
            })
            .cloned()
    }

    fn direct_driver(&self) -> Arc<dyn ReActorSystemDriver> {
        Arc::clone(&self.inner.direct) as Arc<dyn ReActorSystemDriver>
    }

    // --- runtime plumbing -------------------------------------------------

    pub(crate) fn next_sequence(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn context_by_id(&self, id: &ReActorId) -> Option<Arc<ReActorContext>> {
        self.inner.contexts.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Source reference stamped on sends without an explicit sender.
    pub(crate) fn sink_ref(&self) -> ReActorRef {
        self.inner
            .root_ref
            .get()
            .cloned()
            .unwrap_or_else(|| {
                ReActorRef::new(
                    ReActorId::new(SYSTEM_ROOT_NAME),
                    self.inner.id.clone(),
                    self.inner.direct.channel_id().clone(),
                )
            })
    }

    pub(crate) fn synthesize_message<P: ReActorPayload>(
        &self,
        source: ReActorRef,
        destination: ReActorRef,
        payload: P,
    ) -> Message {
        Message::new(
            self.next_sequence(),
            source,
            destination,
            crate::message::AckingPolicy::None,
            Arc::new(payload),
        )
    }

    /// Remove a terminated context from the registry, its parent's
    /// children list and the subscription index.
    pub(crate) fn unregister_context(&self, ctx: &Arc<ReActorContext>) {
        self.inner.contexts.remove(ctx.id());
        let parent = ctx.parent_ref();
        if parent.id() != ctx.id() {
            if let Some(parent_ctx) = self.context_by_id(parent.id()) {
                parent_ctx.remove_child(ctx.id());
            }
        }
        self.reindex_subscriptions(ctx.self_ref(), &[]);
    }

    /// Replace `subscriber`'s intercept subscriptions with `rules`.
    pub(crate) fn reindex_subscriptions(&self, subscriber: &ReActorRef, rules: &[SubscriptionRule]) {
        self.inner.subscriptions.retain(|_, subscribers| {
            subscribers.retain(|existing| existing.id() != subscriber.id());
            !subscribers.is_empty()
        });
        for rule in rules {
            self.inner
                .subscriptions
                .entry(rule.payload_type())
                .or_default()
                .push(subscriber.clone());
        }
    }

    /// Deliver passive copies of `msg` to every intercept subscriber of
    /// its payload type, without altering the primary delivery.
    pub(crate) fn run_intercepts(&self, msg: &Message) {
        let subscribers: Vec<ReActorRef> = match self.inner.subscriptions.get(&msg.payload_type()) {
            Some(entry) => entry.value().clone(),
            None => return,
        };
        for subscriber in subscribers {
            if subscriber.id() == msg.destination().id() {
                continue;
            }
            if let Some(ctx) = self.context_by_id(subscriber.id()) {
                if ctx.deliver(msg.clone()).is_delivered() {
                    self.inner.dispatcher.dispatch(&ctx);
                }
            }
        }
    }

    /// Wrap an undeliverable message and route it to the dead-letter
    /// reactor.
    pub(crate) fn route_dead_letter(&self, msg: &Message) {
        let Some(dead_ref) = self.inner.deadletters_ref.get() else {
            error!(
                payload = msg.payload_tag(),
                "dead-letter reactor unavailable; message dropped"
            );
            return;
        };
        if msg.destination().id() == dead_ref.id() {
            error!("dead-letter reactor itself unresolvable; message dropped");
            return;
        }
        warn!(
            destination = %msg.destination().id(),
            payload = msg.payload_tag(),
            "destination unresolved; routing to dead letters"
        );
        let dead = DeadMessage {
            sender: msg.source().clone(),
            payload: msg.payload_arc(),
        };
        let _ = dead_ref.tell_from(msg.source(), dead);
    }

    // --- shutdown ---------------------------------------------------------

    /// Gracefully stop the whole hierarchy, then clean drivers in reverse
    /// registration order and stop the dispatcher.
    ///
    /// # Errors
    /// [`SystemError::ShuttingDown`] when called twice;
    /// [`SystemError::ShutdownTimeout`] when the hierarchy does not
    /// terminate within the configured timeout.
    pub async fn shutdown(&self) -> Result<(), SystemError> {
        {
            let mut state = self.inner.state.write();
            if *state != SystemState::Running {
                return Err(SystemError::ShuttingDown);
            }
            *state = SystemState::ShuttingDown;
        }
        info!(system = %self.inner.id, "reactor system shutting down");

        if let Some(root) = self.inner.root_ref.get() {
            if let Some(root_ctx) = self.context_by_id(root.id()) {
                let completion = root_ctx.stop();
                if timeout(self.inner.config.shutdown_timeout, completion.wait())
                    .await
                    .is_err()
                {
                    return Err(SystemError::ShutdownTimeout(
                        self.inner.config.shutdown_timeout,
                    ));
                }
            }
        }

        let drivers: Vec<Arc<dyn ReActorSystemDriver>> = {
            let mut registered = self.inner.drivers.write();
            registered.drain(..).rev().collect()
        };
        for driver in drivers {
            if let Err(err) = driver.clean_driver_loop().await {
                error!(channel = %driver.channel_id(), error = %err, "driver cleanup failed");
            }
        }

        self.inner.dispatcher.shutdown();
        *self.inner.state.write() = SystemState::Stopped;
        info!(system = %self.inner.id, "reactor system stopped");
        Ok(())
    }
}

impl fmt::Debug for ReActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReActorSystem")
            .field("id", &self.inner.id.to_string())
            .field("reactors", &self.inner.contexts.len())
            .finish()
    }
}

/// Reactions of the system root: lifecycle no-ops, anything else logged.
fn root_reactions() -> ReActions {
    ReActions::new()
        .on::<ReActorInit, _, _>(|_ctx, _msg| async {})
        .on::<ReActorStop, _, _>(|_ctx, _msg| async {})
        .on_any(|_ctx, msg| async move {
            debug!(payload = msg.payload_tag(), "message at system root sink");
        })
}

/// Reactions of the dead-letter reactor: count and log.
fn deadletters_reactions(counter: Arc<AtomicU64>) -> ReActions {
    ReActions::new()
        .on::<ReActorInit, _, _>(|_ctx, _msg| async {})
        .on::<ReActorStop, _, _>(|_ctx, _msg| async {})
        .on::<DeadMessage, _, _>(move |_ctx, dead| {
            let counter = Arc::clone(&counter);
            async move {
                let total = counter.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    sender = %dead.sender.id(),
                    payload = dead.payload.payload_tag(),
                    total,
                    "dead letter received"
                );
            }
        })
        .on_any(|_ctx, msg| async move {
            debug!(payload = msg.payload_tag(), "unwrapped payload at dead letters");
        })
}

/// Register the lifecycle and registry payloads every system can carry
/// over non-local channels.
fn register_builtin_payloads(codec: &PayloadCodec) {
    codec.register::<ReActorInit>();
    codec.register::<ReActorStop>();
    codec.register::<RegistryDriverInitComplete>();
    codec.register::<RegistrySubscriptionComplete>();
    codec.register::<SynchronizationWithServiceRegistryRequest>();
    codec.register::<ReActorSystemChannelIdPublicationRequest>();
    codec.register::<RegistryGateUpserted>();
    codec.register::<RegistryGateRemoved>();
    codec.register::<ServiceServicePublicationRequest>();
    codec.register::<ServiceCancellationRequest>();
    codec.register::<RegistryServicePublicationFailed>();
}
