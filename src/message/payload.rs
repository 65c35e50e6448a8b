//! Dynamic payload model and the wire codec registry.

// Layer 1: Standard library imports
use std::any::{type_name, Any, TypeId};
use std::fmt::Debug;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

// Layer 3: Internal module imports
// (none)

/// Anything a reactor can receive.
///
/// Implemented automatically for every `Debug + Send + Sync + 'static` type;
/// user code never implements this by hand. The trait exists to give the
/// runtime uniform access to the payload's [`TypeId`] (reaction dispatch)
/// and a diagnostic tag (logging).
///
/// Wire transport is opt-in: payload types crossing a non-local channel are
/// additionally registered with the system's [`PayloadCodec`].
pub trait ReActorPayload: Debug + Send + Sync + 'static {
    /// Borrow the payload as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert an owned payload handle into an [`Any`] handle for
    /// `Arc`-level downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Diagnostic tag used in logs; the full type path.
    fn payload_tag(&self) -> &'static str;
}

impl<T: Debug + Send + Sync + 'static> ReActorPayload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn payload_tag(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Payload encode/decode failures.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Payload type was never registered for wire transport
    #[error("no codec registered for payload type {0}")]
    UnregisteredType(&'static str),

    /// Inbound record carries a tag no local type was registered under
    #[error("no codec registered for wire tag {0}")]
    UnregisteredTag(String),

    /// Serde failure while encoding or decoding a payload
    #[error("payload codec failure: {0}")]
    Serde(#[from] serde_json::Error),
}

type EncodeFn = fn(&dyn ReActorPayload) -> Result<serde_json::Value, CodecError>;
type DecodeFn = fn(serde_json::Value) -> Result<Arc<dyn ReActorPayload>, CodecError>;

struct CodecEntry {
    tag: String,
    encode: EncodeFn,
}

/// Tag-keyed registry of wire-capable payload types.
///
/// Encoding is keyed by the payload's `TypeId`, decoding by the wire tag.
/// The default tag is the type's path, which is stable across processes
/// built from the same crate graph; [`PayloadCodec::register_as`] pins an
/// explicit tag when that is not good enough.
///
/// # Example
/// ```rust
/// use reactor_rt::message::{PayloadCodec, ReActorPayload};
///
/// let codec = PayloadCodec::new();
/// codec.register::<String>();
///
/// let (tag, value) = codec.encode(&"hi".to_string()).unwrap();
/// let decoded = codec.decode(&tag, value).unwrap();
/// assert_eq!(decoded.as_any().downcast_ref::<String>().unwrap(), "hi");
/// ```
pub struct PayloadCodec {
    encoders: DashMap<TypeId, CodecEntry>,
    decoders: DashMap<String, DecodeFn>,
}

impl PayloadCodec {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            encoders: DashMap::new(),
            decoders: DashMap::new(),
        }
    }

    /// Register `T` for wire transport under its type path.
    pub fn register<T>(&self)
    where
        T: Serialize + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        self.register_as::<T>(type_name::<T>());
    }

    /// Register `T` for wire transport under an explicit tag.
    pub fn register_as<T>(&self, tag: impl Into<String>)
    where
        T: Serialize + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        let tag = tag.into();
        self.encoders.insert(
            TypeId::of::<T>(),
            CodecEntry {
                tag: tag.clone(),
                encode: encode_value::<T>,
            },
        );
        self.decoders.insert(tag, decode_value::<T>);
    }

    /// Whether the payload's concrete type has a registered codec.
    pub fn can_encode(&self, payload: &dyn ReActorPayload) -> bool {
        self.encoders.contains_key(&payload.as_any().type_id())
    }

    /// Encode a payload into its wire tag plus document.
    ///
    /// # Errors
    /// [`CodecError::UnregisteredType`] when the concrete type was never
    /// registered; [`CodecError::Serde`] on serialization failure.
    pub fn encode(
        &self,
        payload: &dyn ReActorPayload,
    ) -> Result<(String, serde_json::Value), CodecError> {
        let type_id = payload.as_any().type_id();
        let entry = self
            .encoders
            .get(&type_id)
            .ok_or(CodecError::UnregisteredType(payload.payload_tag()))?;
        let value = (entry.encode)(payload)?;
        Ok((entry.tag.clone(), value))
    }

    /// Decode a wire document registered under `tag`.
    ///
    /// # Errors
    /// [`CodecError::UnregisteredTag`] when no local type is registered
    /// under the tag; [`CodecError::Serde`] on deserialization failure.
    pub fn decode(
        &self,
        tag: &str,
        value: serde_json::Value,
    ) -> Result<Arc<dyn ReActorPayload>, CodecError> {
        let decode = self
            .decoders
            .get(tag)
            .map(|entry| *entry.value())
            .ok_or_else(|| CodecError::UnregisteredTag(tag.to_string()))?;
        decode(value)
    }
}

impl Default for PayloadCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for PayloadCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCodec")
            .field("registered", &self.decoders.len())
            .finish()
    }
}

fn encode_value<T>(payload: &dyn ReActorPayload) -> Result<serde_json::Value, CodecError>
where
    T: Serialize + Debug + Send + Sync + 'static,
{
    match payload.as_any().downcast_ref::<T>() {
        Some(typed) => Ok(serde_json::to_value(typed)?),
        None => Err(CodecError::UnregisteredType(payload.payload_tag())),
    }
}

fn decode_value<T>(value: serde_json::Value) -> Result<Arc<dyn ReActorPayload>, CodecError>
where
    T: DeserializeOwned + Debug + Send + Sync + 'static,
{
    let typed: T = serde_json::from_value(value)?;
    Ok(Arc::new(typed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ping {
        round: u32,
    }

    #[test]
    fn test_codec_round_trip() {
        let codec = PayloadCodec::new();
        codec.register::<Ping>();

        let (tag, value) = codec.encode(&Ping { round: 3 }).unwrap();
        let decoded = codec.decode(&tag, value).unwrap();

        assert_eq!(
            decoded.as_any().downcast_ref::<Ping>(),
            Some(&Ping { round: 3 })
        );
    }

    #[test]
    fn test_codec_unregistered_type() {
        let codec = PayloadCodec::new();
        let err = codec.encode(&Ping { round: 1 }).unwrap_err();

        assert!(matches!(err, CodecError::UnregisteredType(_)));
    }

    #[test]
    fn test_codec_unregistered_tag() {
        let codec = PayloadCodec::new();
        let err = codec
            .decode("nobody-home", serde_json::Value::Null)
            .unwrap_err();

        assert!(matches!(err, CodecError::UnregisteredTag(_)));
    }

    #[test]
    fn test_codec_explicit_tag() {
        let codec = PayloadCodec::new();
        codec.register_as::<Ping>("ping.v1");

        let (tag, _) = codec.encode(&Ping { round: 0 }).unwrap();
        assert_eq!(tag, "ping.v1");
    }

    #[test]
    fn test_codec_malformed_document() {
        let codec = PayloadCodec::new();
        codec.register::<Ping>();

        let err = codec
            .decode(type_name::<Ping>(), serde_json::json!({"round": "oops"}))
            .unwrap_err();
        assert!(matches!(err, CodecError::Serde(_)));
    }

    #[test]
    fn test_payload_tag_is_type_path() {
        let payload: Arc<dyn ReActorPayload> = Arc::new(Ping { round: 1 });
        assert!(payload.payload_tag().ends_with("Ping"));
    }
}
