//! Reaction tables: payload type to handler mapping.

// Layer 1: Standard library imports
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use futures::future::{BoxFuture, FutureExt};
use tracing::error;

// Layer 3: Internal module imports
use super::context::ReActorContext;
use crate::message::{Message, ReActorPayload};

pub(crate) type HandlerFn =
    Arc<dyn Fn(Arc<ReActorContext>, Message) -> BoxFuture<'static, ()> + Send + Sync>;

/// Maps a payload's concrete type to its handler, with an optional
/// wildcard for everything unmapped.
///
/// Handlers are the only code running under the reactor's identity; they
/// may call `reply`, `spawn_child`, `stop` and the other context
/// operations. Lookup is by the `TypeId` precomputed at send time, so the
/// hot path never inspects the payload.
///
/// # Example
/// ```rust
/// use reactor_rt::reactor::ReActions;
///
/// let reactions = ReActions::new()
///     .on::<String, _, _>(|ctx, text| async move {
///         ctx.reply(text.to_uppercase());
///     })
///     .on_any(|_ctx, msg| async move {
///         tracing::debug!(payload = msg.payload_tag(), "ignored");
///     });
/// # let _ = reactions;
/// ```
#[derive(Default)]
pub struct ReActions {
    handlers: HashMap<TypeId, HandlerFn>,
    wildcard: Option<HandlerFn>,
}

impl ReActions {
    /// An empty table: every message falls through to the wildcard, or is
    /// dropped with a log line when there is none.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for payload type `T`, replacing any previous
    /// registration for the same type.
    pub fn on<T, F, Fut>(mut self, handler: F) -> Self
    where
        T: ReActorPayload,
        F: Fn(Arc<ReActorContext>, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: HandlerFn = Arc::new(move |ctx, msg: Message| {
            let handler = Arc::clone(&handler);
            let payload = msg.payload_arc();
            async move {
                match payload.into_any().downcast::<T>() {
                    Ok(typed) => handler(ctx, typed).await,
                    Err(_) => error!(
                        payload = msg.payload_tag(),
                        "reaction table downcast failed"
                    ),
                }
            }
            .boxed()
        });
        self.handlers.insert(TypeId::of::<T>(), erased);
        self
    }

    /// Register the wildcard handler covering unmapped payload types.
    pub fn on_any<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Arc<ReActorContext>, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.wildcard = Some(Arc::new(move |ctx, msg| {
            let handler = Arc::clone(&handler);
            handler(ctx, msg).boxed()
        }));
        self
    }

    /// Resolve the handler for a payload type, falling back to the
    /// wildcard.
    pub(crate) fn handler_for(&self, payload_type: TypeId) -> Option<HandlerFn> {
        self.handlers
            .get(&payload_type)
            .or(self.wildcard.as_ref())
            .map(Arc::clone)
    }

    /// Whether a payload type resolves to a dedicated (non-wildcard)
    /// handler.
    pub fn handles(&self, payload_type: TypeId) -> bool {
        self.handlers.contains_key(&payload_type)
    }
}

impl fmt::Debug for ReActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReActions")
            .field("handlers", &self.handlers.len())
            .field("wildcard", &self.wildcard.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reactions_resolve_registered_type() {
        let reactions = ReActions::new().on::<String, _, _>(|_ctx, _msg| async {});

        assert!(reactions.handles(TypeId::of::<String>()));
        assert!(reactions.handler_for(TypeId::of::<String>()).is_some());
        assert!(reactions.handler_for(TypeId::of::<u64>()).is_none());
    }

    #[test]
    fn test_reactions_wildcard_covers_unmapped() {
        let reactions = ReActions::new()
            .on::<String, _, _>(|_ctx, _msg| async {})
            .on_any(|_ctx, _msg| async {});

        assert!(reactions.handler_for(TypeId::of::<u64>()).is_some());
        assert!(!reactions.handles(TypeId::of::<u64>()));
    }
}
