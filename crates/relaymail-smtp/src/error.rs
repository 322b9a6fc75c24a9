//! Error types for SMTP sessions.
//!
//! Two families are kept apart: [`Error`] ends the whole session, while
//! [`MessageError`] only abandons the message being transmitted.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::command::Step;
use crate::types::{Reply, ReplyCode};

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Session-fatal error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the connection.
    #[error("network error: {0}")]
    Io(#[from] io::Error),

    /// No reply line arrived in time.
    #[error("network read timeout after {0:?}")]
    ReadTimeout(Duration),

    /// A line could not be written in time.
    #[error("network write timeout after {0:?}")]
    WriteTimeout(Duration),

    /// Server sent a reply line longer than the configured limit.
    #[error("network input line too long (limit {0} bytes)")]
    LineTooLong(usize),

    /// Server answered a session step with an unexpected status.
    #[error("{step} failed: {line}")]
    Rejected {
        /// Step that was refused.
        step: Step,
        /// Status of the offending reply.
        code: ReplyCode,
        /// Offending reply line, as received.
        line: String,
    },

    /// Server broke the reply grammar.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A message was abandoned after its text had started.
    ///
    /// The server is still collecting message text, so the connection is
    /// dropped without the terminating `.` and the partial message is lost.
    #[error("message abandoned during text transfer: {0}")]
    MessageAborted(#[source] MessageError),

    /// Credentials were supplied but no announced mechanism is implemented.
    #[error("authorisation mechanisms not supported; server said it supports: {offered}")]
    AuthUnsupported {
        /// Mechanism list from the server's AUTH line.
        offered: String,
    },
}

impl Error {
    /// Creates a rejection error from the reply that refused `step`.
    #[must_use]
    pub fn rejected(step: Step, reply: &Reply) -> Self {
        Self::Rejected {
            step,
            code: reply.code,
            line: reply.line.clone(),
        }
    }

    /// Returns true if the connection itself failed (I/O, timeout, oversize line).
    ///
    /// Once this is true the connection must not be used again.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::ReadTimeout(_) | Self::WriteTimeout(_) | Self::LineTooLong(_)
        )
    }

    /// Returns true if nothing more may be sent on the connection, not even QUIT.
    #[must_use]
    pub const fn poisons_connection(&self) -> bool {
        self.is_transport() || matches!(self, Self::MessageAborted(_))
    }
}

/// Failure confined to a single spool message.
///
/// The message file is kept for a later run and the session moves on.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Spool file could not be opened.
    #[error("cannot open mail file {}: {source}", path.display())]
    Open {
        /// Spool file path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// A line did not match the envelope part expected at its position.
    #[error("{expected} line error in mail file {}", path.display())]
    Envelope {
        /// Spool file path.
        path: PathBuf,
        /// Envelope keyword that was expected (`MAIL`, `RCPT` or `DATA`).
        expected: &'static str,
    },

    /// File ended before the envelope was complete.
    #[error("incomplete envelope in mail file {}", path.display())]
    Incomplete {
        /// Spool file path.
        path: PathBuf,
    },

    /// A line exceeded the limit or lacked its terminator.
    #[error("line {line} too long in mail file {}", path.display())]
    LineTooLong {
        /// Spool file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
    },

    /// Reading the spool file failed before end of file.
    #[error("read error on mail file {}: {source}", path.display())]
    Read {
        /// Spool file path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Server refused one of the message's commands or its text.
    #[error("{step} failed: {line}")]
    Rejected {
        /// Step that was refused.
        step: Step,
        /// Status of the offending reply.
        code: ReplyCode,
        /// Offending reply line, as received.
        line: String,
    },
}

impl MessageError {
    /// Creates a rejection error from the reply that refused `step`.
    #[must_use]
    pub fn rejected(step: Step, reply: &Reply) -> Self {
        Self::Rejected {
            step,
            code: reply.code,
            line: reply.line.clone(),
        }
    }

    /// Returns true if the spool file itself is malformed.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Envelope { .. } | Self::Incomplete { .. } | Self::LineTooLong { .. }
        )
    }
}
