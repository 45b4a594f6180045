//! Error taxonomy shared by the dashboard library.
//!
//! Network failures and validation problems are ordinary values here; the
//! caller decides whether to surface them inline or abort. Malformed numeric
//! record fields never become errors (see [`crate::records::filter`]).

use thiserror::Error;

use crate::task::TaskStatus;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The backend answered with a non-2xx status. `body` is the raw
    /// response text, which is what the user sees.
    #[error("{context}: {body}")]
    Http {
        context: &'static str,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connection refused, timeout).
    #[error("{context}: {message}")]
    Transport {
        context: &'static str,
        message: String,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("{context}: malformed response body: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },

    /// User input rejected before anything was submitted.
    #[error("{0}")]
    Validation(String),

    #[error("task {0} is already registered")]
    DuplicateTask(u64),

    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("task {id} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        id: u64,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("task {0} is already completed")]
    AlreadyCompleted(u64),
}

impl DashboardError {
    /// Whether the error came from talking to the backend.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Transport { .. } | Self::Decode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
