//! The remoting root reactor.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tracing::{debug, error, warn};

// Layer 3: Internal module imports
use super::messages::{
    ReActorSystemChannelIdPublicationRequest, RegistryDriverInitComplete, RegistryGateRemoved,
    RegistryGateUpserted, RegistryServicePublicationFailed, RegistrySubscriptionComplete,
    ServiceCancellationRequest, ServiceServicePublicationRequest,
    SynchronizationWithServiceRegistryRequest,
};
use crate::message::{ReActorInit, ReActorPayload, ReActorStop};
use crate::reactor::{ReActions, ReActorContext};

/// Name the remoting root is registered under.
pub const REMOTING_ROOT_NAME: &str = "remoting-root";

/// Reaction table of the remoting root.
///
/// Registry drivers are spawned as children of this reactor; gates learned
/// from them flow into the routing table, and publication traffic fans out
/// to every child.
pub(crate) fn remoting_root_reactions() -> ReActions {
    let spurious = Arc::new(AtomicU64::new(0));

    ReActions::new()
        .on::<ReActorInit, _, _>(|_ctx, _msg| async {})
        .on::<ReActorStop, _, _>(|_ctx, _msg| async {})
        .on::<RegistryDriverInitComplete, _, _>(|ctx, _msg| async move {
            // Bootstrap: the driver is up, ask it to synchronize.
            let status = ctx.reply(SynchronizationWithServiceRegistryRequest).await;
            if !status.is_delivered() {
                warn!(status = ?status, "registry synchronization request undelivered");
            }
        })
        .on::<RegistrySubscriptionComplete, _, _>(|ctx, _msg| async move {
            publish_local_channels(&ctx).await;
        })
        .on::<RegistryGateUpserted, _, _>(|ctx, msg| async move {
            let system = ctx.system();
            if msg.system_id == *system.id() {
                // Our own advertisement echoed back.
                return;
            }
            system.register_gate(&msg.system_id, &msg.channel_id, msg.channel_data.clone());
            debug!(
                peer = %msg.system_id,
                channel = %msg.channel_id,
                "registry gate upserted"
            );
        })
        .on::<RegistryGateRemoved, _, _>(|ctx, msg| async move {
            let system = ctx.system();
            if msg.system_id == *system.id() {
                // Our own entry was lost; trigger a full re-publish.
                warn!(channel = %msg.channel_id, "local gate dropped from registry; republishing");
                ctx.self_tell(RegistrySubscriptionComplete);
                return;
            }
            system.unregister_gate(&msg.system_id, &msg.channel_id);
            debug!(
                peer = %msg.system_id,
                channel = %msg.channel_id,
                "registry gate removed"
            );
        })
        .on::<ServiceServicePublicationRequest, _, _>(|ctx, msg| async move {
            fan_out(&ctx, msg.as_ref().clone()).await;
        })
        .on::<ServiceCancellationRequest, _, _>(|ctx, msg| async move {
            fan_out(&ctx, msg.as_ref().clone()).await;
        })
        .on::<RegistryServicePublicationFailed, _, _>(|_ctx, msg| async move {
            error!(
                service = %msg.service_name,
                cause = %msg.error,
                "service publication failed"
            );
        })
        .on_any(move |_ctx, msg| {
            let spurious = Arc::clone(&spurious);
            async move {
                let seen = spurious.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    payload = msg.payload_tag(),
                    total = seen,
                    "spurious message at remoting root"
                );
            }
        })
}

/// Advertise every non-direct local channel.
///
/// Responds to the requesting registry driver; a self-triggered re-publish
/// (sender is the root itself) fans out to all registry-driver children
/// instead.
async fn publish_local_channels(ctx: &Arc<ReActorContext>) {
    let system = ctx.system();
    let sender = ctx.sender();
    let self_triggered = sender == *ctx.self_ref();

    for (channel_id, properties) in system.remote_channels() {
        let request = ReActorSystemChannelIdPublicationRequest {
            system_id: system.id().clone(),
            channel_id,
            properties,
        };
        if self_triggered {
            fan_out(ctx, request).await;
        } else {
            let status = sender.tell_from(ctx.self_ref(), request.clone()).await;
            if !status.is_delivered() {
                warn!(
                    channel = %request.channel_id,
                    status = ?status,
                    "channel publication undelivered"
                );
            }
        }
    }
}

/// Deliver a copy of `payload` to every registry-driver child, logging
/// failures. Children are snapshotted under the structural read-lock at
/// handler entry.
async fn fan_out<P: ReActorPayload + Clone>(ctx: &Arc<ReActorContext>, payload: P) {
    for child in ctx.children() {
        let status = child.tell_from(ctx.self_ref(), payload.clone()).await;
        if !status.is_delivered() {
            warn!(
                child = %child.id(),
                status = ?status,
                "registry fan-out delivery failed"
            );
        }
    }
}
