//! Machine errors.

use crate::core::{StateId, StatusCode};
use thiserror::Error;

/// Errors recorded as the machine status.
///
/// Dispatch-time errors are only recorded, never returned; the machine
/// recovers into the default-error state and keeps running. Control
/// operations (`start`, `stop`) both record and return them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("Current state is undefined")]
    CurrentStateUndefined,

    #[error("Request for transition to unknown state {requested}")]
    UnknownStateRequested { requested: StateId },

    #[error("State machine is already running")]
    AlreadyRunning,

    #[error("State machine is not running")]
    NotRunning,

    #[error("Failed to spawn worker thread: {0}")]
    SpawnFailed(String),

    #[error("Worker thread panicked")]
    WorkerPanicked,

    #[error("Idle timeout must be greater than zero")]
    ZeroIdleTimeout,
}

impl MachineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CurrentStateUndefined => StatusCode::CurrentStateUndefined,
            Self::UnknownStateRequested { .. } => StatusCode::UnknownStateRequested,
            Self::AlreadyRunning => StatusCode::AlreadyRunning,
            Self::NotRunning => StatusCode::NotRunning,
            Self::SpawnFailed(_) | Self::WorkerPanicked => StatusCode::WorkerFailed,
            Self::ZeroIdleTimeout => StatusCode::InvalidTimeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(
            MachineError::UnknownStateRequested {
                requested: StateId::from_static("NoState")
            }
            .status_code(),
            StatusCode::UnknownStateRequested
        );
        assert_eq!(
            MachineError::CurrentStateUndefined.status_code().code(),
            -1
        );
        assert!(MachineError::AlreadyRunning.status_code().is_warning());
        assert!(MachineError::WorkerPanicked.status_code().is_error());
        assert_eq!(MachineError::ZeroIdleTimeout.status_code(), StatusCode::InvalidTimeout);
    }

    #[test]
    fn unknown_state_message_names_the_state() {
        let err = MachineError::UnknownStateRequested {
            requested: StateId::from_static("NoState"),
        };
        assert_eq!(err.to_string(), "Request for transition to unknown state NoState");
    }
}
