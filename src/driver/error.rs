//! Driver-level error types.

// Layer 1: Standard library imports
use std::io;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::message::CodecError;
use crate::util::ChannelId;

/// Failures of a channel driver's init, send or cleanup paths.
///
/// An init failure is fatal for that driver only; other channels keep
/// operating.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The channel's resources could not be acquired
    #[error("channel {channel} init failed: {reason}")]
    ChannelInit { channel: ChannelId, reason: String },

    /// The driver was attached to a system twice
    #[error("driver already initialized")]
    AlreadyInitialized,

    /// An operation ran before `init_driver_loop`
    #[error("driver not initialized")]
    NotInitialized,

    /// Journal or channel I/O failure
    #[error("channel I/O failure: {0}")]
    Io(#[from] io::Error),

    /// Payload could not be wire-encoded or decoded
    #[error(transparent)]
    Codec(#[from] CodecError),
}
