//! Wire form of an envelope crossing a non-local channel.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::envelope::{AckingPolicy, Message};
use super::payload::{CodecError, PayloadCodec};
use crate::reactor::ReActorRef;

/// Self-describing wire record holding one serialized [`Message`].
///
/// References serialize as bare identities; the ingress side rebinds their
/// driver handles before the message re-enters the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Per-system monotonic sequence number.
    pub sequence: u64,
    /// Sender identity.
    pub source: ReActorRef,
    /// Destination identity.
    pub destination: ReActorRef,
    /// Acking policy requested by the sender.
    pub ack_policy: AckingPolicy,
    /// Original send timestamp.
    pub timestamp: DateTime<Utc>,
    /// Codec tag the payload was registered under.
    pub payload_tag: String,
    /// Encoded payload document.
    pub payload: serde_json::Value,
}

impl WireMessage {
    /// Encode an envelope into wire bytes.
    ///
    /// # Errors
    /// Fails when the payload type has no registered codec or does not
    /// serialize.
    pub fn encode(msg: &Message, codec: &PayloadCodec) -> Result<Vec<u8>, CodecError> {
        let (payload_tag, payload) = codec.encode(msg.payload())?;
        let wire = Self {
            sequence: msg.sequence(),
            source: msg.source().clone(),
            destination: msg.destination().clone(),
            ack_policy: msg.ack_policy(),
            timestamp: msg.timestamp(),
            payload_tag,
            payload,
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Parse a wire record.
    ///
    /// # Errors
    /// Fails on a malformed document.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Materialize the record back into a runtime envelope.
    ///
    /// # Errors
    /// Fails when the payload tag is unknown locally or the document does
    /// not deserialize into the registered type.
    pub fn into_message(self, codec: &PayloadCodec) -> Result<Message, CodecError> {
        let payload = codec.decode(&self.payload_tag, self.payload)?;
        Ok(Message::from_wire(
            self.sequence,
            self.source,
            self.destination,
            self.ack_policy,
            self.timestamp,
            payload,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::util::{ChannelId, ChannelType, ReActorId, ReActorSystemId};
    use std::sync::Arc;

    fn journal_ref(name: &str) -> ReActorRef {
        ReActorRef::new(
            ReActorId::new(name),
            ReActorSystemId::new("wire-test"),
            ChannelId::new(ChannelType::LocalJournal, "main"),
        )
    }

    #[test]
    fn test_wire_round_trip_preserves_envelope() {
        let codec = PayloadCodec::new();
        codec.register::<String>();

        let msg = Message::new(
            11,
            journal_ref("src"),
            journal_ref("dst"),
            AckingPolicy::SenderRequired,
            Arc::new("payload".to_string()),
        );

        let bytes = WireMessage::encode(&msg, &codec).unwrap();
        let back = WireMessage::decode(&bytes)
            .unwrap()
            .into_message(&codec)
            .unwrap();

        assert_eq!(back.sequence(), 11);
        assert_eq!(back.ack_policy(), AckingPolicy::SenderRequired);
        assert_eq!(back.timestamp(), msg.timestamp());
        assert_eq!(back.source().id(), msg.source().id());
        assert_eq!(back.destination().id(), msg.destination().id());
        assert_eq!(back.payload_as::<String>().map(String::as_str), Some("payload"));
    }

    #[test]
    fn test_wire_unregistered_payload_fails_encode() {
        let codec = PayloadCodec::new();
        let msg = Message::new(
            1,
            journal_ref("src"),
            journal_ref("dst"),
            AckingPolicy::None,
            Arc::new(99u32),
        );

        assert!(WireMessage::encode(&msg, &codec).is_err());
    }

    #[test]
    fn test_wire_malformed_bytes_fail_decode() {
        assert!(WireMessage::decode(b"not json at all").is_err());
    }
}
