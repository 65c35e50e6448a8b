//! System-level error types.

// Layer 1: Standard library
use std::time::Duration;

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
use crate::driver::DriverError;
use crate::util::ReActorId;

/// System-level errors for reactor runtime operations.
#[derive(Error, Debug)]
pub enum SystemError {
    /// A reactor with this id already exists; ids cannot coexist
    #[error("duplicate reactor id: {0}")]
    DuplicateReActorId(ReActorId),

    /// No reactor registered under this id
    #[error("reactor not found: {0}")]
    ReActorNotFound(ReActorId),

    /// Reactor registration failed
    #[error("failed to spawn reactor: {0}")]
    SpawnFailed(String),

    /// The system is shutting down and accepts no new operations
    #[error("system shutdown in progress")]
    ShuttingDown,

    /// Graceful shutdown did not finish in time
    #[error("shutdown timeout exceeded after {0:?}")]
    ShutdownTimeout(Duration),

    /// Configuration validation failed
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A channel driver failed; fatal for that driver only
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

impl SystemError {
    /// Whether the error indicates the whole system must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SystemError::ShuttingDown | SystemError::ShutdownTimeout(_)
        )
    }

    /// Whether the system keeps operating despite the error.
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_id_display() {
        let id = ReActorId::new("twin");
        let err = SystemError::DuplicateReActorId(id.clone());
        let text = err.to_string();
        assert!(text.contains("duplicate reactor id"));
        assert!(text.contains("twin"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(SystemError::ShuttingDown.is_fatal());
        assert!(SystemError::ShutdownTimeout(Duration::from_secs(30)).is_fatal());
        assert!(!SystemError::SpawnFailed("x".to_string()).is_fatal());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(SystemError::ReActorNotFound(ReActorId::new("gone")).is_recoverable());
        assert!(SystemError::ConfigError("bad".to_string()).is_recoverable());
        assert!(!SystemError::ShuttingDown.is_recoverable());
    }

    #[test]
    fn test_driver_error_conversion() {
        let err: SystemError = DriverError::NotInitialized.into();
        assert!(matches!(err, SystemError::Driver(_)));
        assert!(err.is_recoverable());
    }
}
