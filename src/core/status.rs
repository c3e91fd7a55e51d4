//! Machine status codes.
//!
//! The status is the result of the machine's last operation. It can be
//! polled at any time, independently of whatever produced it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric result codes. Negative codes are errors, positive codes warnings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    CurrentStateUndefined,
    UnknownStateRequested,
    WorkerFailed,
    InvalidTimeout,
    AlreadyRunning,
    NotRunning,
}

impl StatusCode {
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::CurrentStateUndefined => -1,
            Self::UnknownStateRequested => -2,
            Self::WorkerFailed => -3,
            Self::InvalidTimeout => -4,
            Self::AlreadyRunning => 1,
            Self::NotRunning => 2,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    pub fn is_error(self) -> bool {
        self.code() < 0
    }

    pub fn is_warning(self) -> bool {
        self.code() > 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::CurrentStateUndefined => "CURRENT_STATE_UNDEFINED",
            Self::UnknownStateRequested => "UNKNOWN_STATE_REQUESTED",
            Self::WorkerFailed => "WORKER_FAILED",
            Self::InvalidTimeout => "INVALID_TIMEOUT",
            Self::AlreadyRunning => "ALREADY_RUNNING",
            Self::NotRunning => "NOT_RUNNING",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Last status code together with its diagnostic message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: String::new(),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ok()
    }
}
