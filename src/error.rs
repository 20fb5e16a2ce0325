//! Error types for the detection session
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Camera or model could not be acquired. Terminal; not retried.
    #[error("perception unavailable: {0}")]
    PerceptionUnavailable(String),

    /// `start` was called on a session that already ran and was torn down.
    #[error("session already stopped")]
    Stopped,

    /// Frame loop entered before `start` completed.
    #[error("session not started")]
    NotStarted,
}

pub type Result<T> = std::result::Result<T, SessionError>;
