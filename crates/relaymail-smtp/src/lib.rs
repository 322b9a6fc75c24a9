//! # relaymail-smtp
//!
//! Client side of an outbound SMTP relay: hands spooled messages to a
//! smarthost, or asks it to flush its queue for a domain with ETRN.
//!
//! ## Features
//!
//! - **EHLO with HELO fallback**: servers answering EHLO with 500/502 are
//!   greeted again with HELO
//! - **Authentication**: LOGIN and PLAIN, picked from the server's `AUTH`
//!   announcement
//! - **Spool transmission**: envelope lines are validated while the file is
//!   streamed, and message text is dot-stuffed
//! - **Bounded I/O**: every line read or written has a timeout and a length
//!   limit
//!
//! ## Spool file format
//!
//! ```text
//! MAIL FROM:<sender@example.org>
//! RCPT TO:<rcpt@example.net>
//! DATA
//! Subject: hello
//!
//! message text
//! ```
//!
//! The envelope lines are sent as commands; everything after `DATA` is the
//! message text. A file is deleted once the server accepts it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use relaymail_smtp::{MessageSource, SessionConfig, connect, run_session};
//! use relaymail_smtp::config::{DEFAULT_IO_TIMEOUT, DEFAULT_PORT};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut source = MessageSource::new();
//!     source.push_directory("/var/spool/relaymail");
//!     let messages = source.messages().await;
//!
//!     let mut channel = connect("smtp.example.com", DEFAULT_PORT, DEFAULT_IO_TIMEOUT)
//!         .await
//!         .expect("connect");
//!     let config = SessionConfig::builder("client.example.org")
//!         .credentials("user", "secret")
//!         .build();
//!
//!     let result = run_session(&mut channel, &messages, &config).await;
//!     println!("{} sent, {} failed", result.messages_sent, result.messages_failed);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`codec`]: base64 for AUTH responses
//! - [`command`]: commands sent by the session
//! - [`config`]: session configuration and credentials
//! - [`connection`]: TCP connect and the line channel
//! - [`parser`]: reply line parser
//! - [`session`]: the session driver and spool transmission
//! - [`spool`]: message sources and the pending-work check
//! - [`types`]: replies and AUTH mechanisms

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod command;
pub mod config;
pub mod connection;
mod error;
pub mod parser;
pub mod session;
pub mod spool;
pub mod types;

pub use config::{Credentials, SessionConfig};
pub use connection::{LineChannel, connect};
pub use error::{Error, MessageError, Result};
pub use session::{SessionResult, run_session};
pub use spool::{MessageSource, SpoolEntry, has_pending_work};
pub use types::{AuthSelection, Mechanism, Reply, ReplyCode};
