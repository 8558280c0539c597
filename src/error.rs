//! Error types for mailspool

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Invalid message id: {0:?}")]
    InvalidId(String),

    #[error("Unknown mailbox: {0}")]
    UnknownMailbox(String),

    #[error("Message {id} not found in mailbox {user}")]
    MessageNotFound { user: String, id: u64 },

    #[error("Message {id} already exists in mailbox {user}")]
    DuplicateId { user: String, id: u64 },

    #[error("Message ids exhausted in mailbox {0}")]
    IdsExhausted(String),

    #[error("Malformed stored message: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[source] std::io::Error),

    #[error("Peer closed the connection")]
    Disconnected,

    #[error("Session cancelled")]
    Cancelled,

    #[error("Timed out waiting on the client")]
    TimedOut,

    #[error("Line exceeds {0} bytes")]
    LineTooLong(usize),

    #[error("Server rejected {0}")]
    Rejected(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Whether this error means the byte stream is no longer usable.
    ///
    /// Everything else is a command-level failure that is answered
    /// with `ERR` while the session carries on.
    #[must_use]
    pub const fn ends_session(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Disconnected
                | Self::Cancelled
                | Self::TimedOut
                | Self::LineTooLong(_)
        )
    }

    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_end_the_session() {
        assert!(Error::Disconnected.ends_session());
        assert!(Error::Cancelled.ends_session());
        assert!(Error::TimedOut.ends_session());
        assert!(Error::Transport(std::io::Error::other("reset")).ends_session());
        assert!(Error::LineTooLong(1024).ends_session());
    }

    #[test]
    fn command_errors_keep_the_session() {
        assert!(!Error::UnknownMailbox("carol".into()).ends_session());
        assert!(!Error::InvalidId("x".into()).ends_session());
        assert!(!Error::Io(std::io::Error::other("disk full")).ends_session());
        assert!(!Error::IdsExhausted("bob".into()).ends_session());
    }
}
