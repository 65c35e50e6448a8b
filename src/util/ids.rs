// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Namespace for deriving reactor identifiers from their human names.
const REACTOR_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x9c, 0x1a, 0x4e, 0x2b, 0x7f, 0x03, 0x45, 0xd6, 0x8a, 0x5e, 0x21, 0x9b, 0x6c, 0xf4, 0x0d, 0x73,
]);

/// Unique identifier for a reactor within one reactor system.
///
/// Combines a UUID with the reactor's human-readable name. The UUID is
/// derived deterministically (v5) from the name, so spawning two reactors
/// with the same name inside one system collides and is rejected by the
/// registry. Uniqueness is an invariant: two reactors with the same id
/// cannot coexist.
///
/// # Example
/// ```rust
/// use reactor_rt::util::ReActorId;
///
/// let a = ReActorId::new("worker-1");
/// let b = ReActorId::new("worker-1");
/// assert_eq!(a, b); // Same name, same identity
/// assert_ne!(a, ReActorId::new("worker-2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReActorId {
    uuid: Uuid,
    name: String,
}

impl ReActorId {
    /// Derive a reactor id from its human name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            uuid: Uuid::new_v5(&REACTOR_ID_NAMESPACE, name.as_bytes()),
            name,
        }
    }

    /// Get the underlying UUID.
    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    /// Get the human-readable reactor name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for ReActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.uuid)
    }
}

/// Per-process identity of a reactor system.
///
/// Every envelope carries the source and destination system ids so that
/// ingress loops can detect and drop traffic addressed to another system
/// sharing the same channel.
///
/// # Example
/// ```rust
/// use reactor_rt::util::ReActorSystemId;
///
/// let a = ReActorSystemId::new("node-a");
/// let b = ReActorSystemId::new("node-a");
/// assert_ne!(a, b); // Fresh UUID per process, even with equal names
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReActorSystemId {
    uuid: Uuid,
    name: String,
}

impl ReActorSystemId {
    /// Create a new system id with a random UUID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
        }
    }

    /// Get the underlying UUID.
    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    /// Get the system name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for ReActorSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.uuid)
    }
}

/// Transport family of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// In-process loopback delivery straight into the destination mailbox.
    DirectCommunication,
    /// Persistent journal-backed local channel.
    LocalJournal,
    /// Externally provided transport, named by its driver.
    Custom(String),
}

impl Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectCommunication => write!(f, "direct"),
            Self::LocalJournal => write!(f, "local_journal"),
            Self::Custom(tag) => write!(f, "{tag}"),
        }
    }
}

/// Uniquely names one transport instance owned by a driver.
///
/// A reactor system may expose several channels simultaneously; each is
/// identified by its transport family plus an instance name.
///
/// # Example
/// ```rust
/// use reactor_rt::util::{ChannelId, ChannelType};
///
/// let id = ChannelId::new(ChannelType::LocalJournal, "main");
/// assert_eq!(id.to_string(), "local_journal:main");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId {
    channel_type: ChannelType,
    name: String,
}

impl ChannelId {
    /// Create a channel id from a transport family and an instance name.
    pub fn new(channel_type: ChannelType, name: impl Into<String>) -> Self {
        Self {
            channel_type,
            name: name.into(),
        }
    }

    /// Get the transport family tag.
    pub fn channel_type(&self) -> &ChannelType {
        &self.channel_type
    }

    /// Get the channel instance name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel_type, self.name)
    }
}
