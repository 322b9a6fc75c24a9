//! The session driver.
//!
//! One call to [`run_session`] drives a complete client conversation on an
//! already connected channel:
//!
//! ```text
//! greeting ─→ EHLO (HELO fallback) ─→ AUTH? ─┬─→ ETRN ──────────────┬─→ QUIT
//!                                            └─→ message, message… ─┘
//! ```
//!
//! Failures of a single message are recorded and the loop moves on; any
//! other failure ends the session.

mod authenticate;
mod negotiate;
mod transmit;

use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::command::{Command, Step};
use crate::config::SessionConfig;
use crate::connection::LineChannel;
use crate::error::{Error, Result};
use crate::types::{AuthSelection, Reply};

pub use transmit::{EnvelopeState, LineAction};
use transmit::Delivery;

/// Outcome of one session, reported to the caller.
#[derive(Debug)]
pub struct SessionResult {
    /// True if the whole conversation completed without a fatal error.
    pub success: bool,
    /// Messages accepted by the server (and removed from the spool).
    pub messages_sent: usize,
    /// Messages attempted but not delivered; their files are kept.
    pub messages_failed: usize,
    /// True if an ETRN request was accepted by the server.
    pub etrn_requested: bool,
    /// The error that ended the session, if any.
    pub error: Option<Error>,
}

/// Runs one SMTP session over `channel`.
///
/// With `config.etrn_domain` set, only ETRN is sent and `messages` is
/// ignored. Otherwise every message file is transmitted in order.
pub async fn run_session<S>(
    channel: &mut LineChannel<S>,
    messages: &[PathBuf],
    config: &SessionConfig,
) -> SessionResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut session = Session::new(channel, config);
    let outcome = session.drive(messages).await;

    if let Err(e) = &outcome {
        tracing::error!(error = %e, "session failed");
        // Only a healthy connection can still carry QUIT.
        if !e.poisons_connection() && !session.quit_sent {
            session.abort().await;
        }
    }

    SessionResult {
        success: outcome.is_ok(),
        messages_sent: session.messages_sent,
        messages_failed: session.messages_failed,
        etrn_requested: session.etrn_requested,
        error: outcome.err(),
    }
}

/// Per-session state, discarded when the session ends.
struct Session<'a, S> {
    channel: &'a mut LineChannel<S>,
    config: &'a SessionConfig,
    /// True once EHLO was accepted.
    esmtp: bool,
    auth: AuthSelection,
    messages_sent: usize,
    messages_failed: usize,
    etrn_requested: bool,
    quit_sent: bool,
}

impl<'a, S> Session<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn new(channel: &'a mut LineChannel<S>, config: &'a SessionConfig) -> Self {
        Self {
            channel,
            config,
            esmtp: false,
            auth: AuthSelection::NotOffered,
            messages_sent: 0,
            messages_failed: 0,
            etrn_requested: false,
            quit_sent: false,
        }
    }

    async fn drive(&mut self, messages: &[PathBuf]) -> Result<()> {
        self.greet().await?;
        self.negotiate().await?;
        self.authenticate().await?;

        let etrn = match self.config.etrn_domain.clone() {
            Some(domain) => Some(self.etrn(&domain).await?),
            None => {
                self.deliver_all(messages).await?;
                None
            }
        };

        self.quit_sent = true;
        let reply = self.command(Command::Quit).await?;
        if !reply.is_success() {
            return Err(Error::rejected(Step::Quit, &reply));
        }
        tracing::info!(reply = %reply, "connection closed");

        match (etrn, &self.config.etrn_domain) {
            (Some(Err(rejection)), _) => return Err(rejection),
            (Some(Ok(())), Some(domain)) => tracing::info!("[ETRN sent for {domain}]"),
            _ => tracing::info!(
                "[{} message{} sent]",
                self.messages_sent,
                plural(self.messages_sent)
            ),
        }
        Ok(())
    }

    async fn deliver_all(&mut self, messages: &[PathBuf]) -> Result<()> {
        for path in messages {
            tracing::debug!(
                path = %path.display(),
                "transmitting message {}",
                self.messages_sent + 1
            );
            match self.transmit(path).await? {
                Delivery::Sent => {
                    self.messages_sent += 1;
                    tracing::info!(path = %path.display(), "message sent");
                }
                Delivery::Failed(e) => {
                    self.messages_failed += 1;
                    if e.is_structural() {
                        tracing::error!(error = %e, "malformed mail file kept");
                    } else {
                        tracing::warn!(error = %e, "message not sent");
                    }
                }
            }
        }
        Ok(())
    }

    /// Sends ETRN. A refusal is returned as the inner error so the session
    /// can still close cleanly before reporting it.
    async fn etrn(&mut self, domain: &str) -> Result<Result<()>> {
        let reply = self
            .command(Command::Etrn {
                domain: domain.to_string(),
            })
            .await?;
        if !reply.is_positive() {
            return Ok(Err(Error::rejected(Step::Etrn, &reply)));
        }
        self.etrn_requested = true;
        Ok(Ok(()))
    }

    /// Best-effort QUIT after a protocol failure.
    async fn abort(&mut self) {
        if let Err(e) = self.command(Command::Quit).await {
            tracing::debug!(error = %e, "QUIT after failure not acknowledged");
        }
    }

    /// Sends a command and reads its complete reply.
    async fn command(&mut self, command: Command) -> Result<Reply> {
        self.send(&command).await?;
        self.read_final().await
    }

    async fn send(&mut self, command: &Command) -> Result<()> {
        tracing::debug!("C: {command:?}");
        self.channel
            .write_all(&command.serialize(), self.config.write_timeout)
            .await
    }

    /// Reads one reply line.
    async fn read_reply(&mut self) -> Result<Reply> {
        let line = self
            .channel
            .read_line(self.config.max_reply_line, self.config.read_timeout)
            .await?;
        Reply::parse(&line)
    }

    /// Reads a complete response, returning its last line.
    async fn read_final(&mut self) -> Result<Reply> {
        let mut reply = self.read_reply().await?;
        while reply.more {
            reply = self.read_reply().await?;
        }
        Ok(reply)
    }
}

const fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
