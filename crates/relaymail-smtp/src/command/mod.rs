//! SMTP command builder.

use crate::types::Mechanism;

/// SMTP command issued by the session itself.
///
/// Envelope lines (`MAIL`, `RCPT`, `DATA`) come verbatim from spool files
/// and are not represented here.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// HELO - Simple greeting
    Helo {
        /// Client hostname
        hostname: String,
    },
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// AUTH - Begin authentication
    Auth {
        /// Authentication mechanism
        mechanism: Mechanism,
        /// Initial response (PLAIN)
        initial_response: Option<String>,
    },
    /// Base64 answer to an authentication prompt
    Credential(String),
    /// ETRN - Request queue run for a domain
    Etrn {
        /// Domain whose queue should be run
        domain: String,
    },
    /// RSET - Reset transaction
    Rset,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command to bytes, CRLF included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Self::Helo { hostname } => {
                buf.extend_from_slice(b"HELO ");
                buf.extend_from_slice(hostname.as_bytes());
            }
            Self::Ehlo { hostname } => {
                buf.extend_from_slice(b"EHLO ");
                buf.extend_from_slice(hostname.as_bytes());
            }
            Self::Auth {
                mechanism,
                initial_response,
            } => {
                buf.extend_from_slice(b"AUTH ");
                buf.extend_from_slice(mechanism.as_str().as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(resp.as_bytes());
                }
            }
            Self::Credential(encoded) => {
                buf.extend_from_slice(encoded.as_bytes());
            }
            Self::Etrn { domain } => {
                buf.extend_from_slice(b"ETRN ");
                buf.extend_from_slice(domain.as_bytes());
            }
            Self::Rset => {
                buf.extend_from_slice(b"RSET");
            }
            Self::Quit => {
                buf.extend_from_slice(b"QUIT");
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

// Credentials stay out of logs and debug output.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Helo { hostname } => write!(f, "HELO {hostname}"),
            Self::Ehlo { hostname } => write!(f, "EHLO {hostname}"),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => write!(f, "AUTH {mechanism}"),
            Self::Auth { mechanism, .. } => write!(f, "AUTH {mechanism} <redacted>"),
            Self::Credential(_) => f.write_str("<redacted>"),
            Self::Etrn { domain } => write!(f, "ETRN {domain}"),
            Self::Rset => f.write_str("RSET"),
            Self::Quit => f.write_str("QUIT"),
        }
    }
}

/// A point in the session where a reply is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Server greeting on connect
    Greeting,
    /// EHLO command
    Ehlo,
    /// HELO fallback
    Helo,
    /// Continuation lines of the EHLO reply
    Extensions,
    /// `AUTH LOGIN` command
    AuthLogin,
    /// Username line of LOGIN
    AuthLoginUsername,
    /// Password line of LOGIN
    AuthLoginPassword,
    /// `AUTH PLAIN` command
    AuthPlain,
    /// Envelope `MAIL` line
    Mail,
    /// Envelope `RCPT` line
    Rcpt,
    /// Envelope `DATA` line
    Data,
    /// Terminating `.` of the message text
    Terminate,
    /// RSET after an abandoned message
    Rset,
    /// ETRN request
    Etrn,
    /// QUIT
    Quit,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Greeting => "connect",
            Self::Ehlo => "EHLO",
            Self::Helo => "HELO",
            Self::Extensions => "EHLO extension",
            Self::AuthLogin => "AUTH LOGIN",
            Self::AuthLoginUsername => "AUTH LOGIN response 1",
            Self::AuthLoginPassword => "AUTH LOGIN response 2",
            Self::AuthPlain => "AUTH PLAIN",
            Self::Mail => "MAIL command",
            Self::Rcpt => "RCPT command",
            Self::Data => "DATA command",
            Self::Terminate => "text terminate",
            Self::Rset => "RSET",
            Self::Etrn => "ETRN",
            Self::Quit => "QUIT",
        })
    }
}
