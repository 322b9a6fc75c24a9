//! Transmission of one spool file.
//!
//! A file is read twice. The first pass is local and only checks that
//! every line is terminated and within the length limit. The second pass
//! streams the file: each line is checked against the envelope state
//! before it is sent, and the state machine below decides whether the
//! server is expected to answer it.
//!
//! ```text
//! AwaitingMail ─MAIL─→ AwaitingRcpt ─RCPT─→ AwaitingRcptOrData ─┬─RCPT─→ (same)
//!                                                               └─other─→ AwaitingData
//! AwaitingData ─DATA─→ DataStarted ─any─→ InText ─any─→ InText
//! ```

use std::borrow::Cow;
use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};

use super::Session;
use crate::command::{Command, Step};
use crate::connection::strip_terminator;
use crate::error::{Error, MessageError, Result};

/// Position within a spool file's envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Expecting the `MAIL` line.
    AwaitingMail,
    /// Expecting the first `RCPT` line.
    AwaitingRcpt,
    /// Expecting another `RCPT` line or the `DATA` line.
    AwaitingRcptOrData,
    /// Expecting the `DATA` line.
    AwaitingData,
    /// `DATA` was sent; the next line is the first text line.
    DataStarted,
    /// Forwarding message text.
    InText,
}

/// What to do with a line that was accepted by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    /// Send the line and require a 2xx/3xx reply.
    Command(Step),
    /// Send the line, dot-stuffed, without waiting for a reply.
    Text,
}

impl EnvelopeState {
    /// Classifies `line` in this state.
    ///
    /// Returns the next state and the action for the line, or the envelope
    /// keyword that was expected if the line is out of place. Some states
    /// hand the same line on to the following state instead of consuming
    /// it; that hand-over is the loop below.
    ///
    /// # Errors
    ///
    /// Returns the expected keyword (`"MAIL"`, `"RCPT"` or `"DATA"`) when
    /// the line does not fit the envelope.
    pub fn advance(self, line: &[u8]) -> std::result::Result<(Self, LineAction), &'static str> {
        let mut state = self;
        loop {
            match state {
                Self::AwaitingMail => {
                    return if has_keyword(line, b"MAIL") {
                        Ok((Self::AwaitingRcpt, LineAction::Command(Step::Mail)))
                    } else {
                        Err("MAIL")
                    };
                }
                Self::AwaitingRcpt => {
                    return if has_keyword(line, b"RCPT") {
                        Ok((Self::AwaitingRcptOrData, LineAction::Command(Step::Rcpt)))
                    } else {
                        Err("RCPT")
                    };
                }
                Self::AwaitingRcptOrData => {
                    if has_keyword(line, b"RCPT") {
                        return Ok((Self::AwaitingRcptOrData, LineAction::Command(Step::Rcpt)));
                    }
                    state = Self::AwaitingData;
                }
                Self::AwaitingData => {
                    return if has_keyword(line, b"DATA") {
                        Ok((Self::DataStarted, LineAction::Command(Step::Data)))
                    } else {
                        Err("DATA")
                    };
                }
                Self::DataStarted => state = Self::InText,
                Self::InText => return Ok((Self::InText, LineAction::Text)),
            }
        }
    }

    /// Returns true once the `DATA` line has been sent.
    #[must_use]
    pub const fn in_data(self) -> bool {
        matches!(self, Self::DataStarted | Self::InText)
    }
}

/// Case-insensitive check for an envelope keyword at the start of a line.
fn has_keyword(line: &[u8], keyword: &[u8]) -> bool {
    line.get(..keyword.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
}

/// Applies SMTP transparency: a text line starting with `.` gets another `.`.
#[must_use]
fn dot_stuff(line: &[u8]) -> Cow<'_, [u8]> {
    if line.first() == Some(&b'.') {
        let mut stuffed = Vec::with_capacity(line.len() + 1);
        stuffed.push(b'.');
        stuffed.extend_from_slice(line);
        Cow::Owned(stuffed)
    } else {
        Cow::Borrowed(line)
    }
}

/// Outcome of transmitting one message.
#[derive(Debug)]
pub(super) enum Delivery {
    /// Accepted by the server; the spool file was removed.
    Sent,
    /// Not delivered; the spool file is kept.
    Failed(MessageError),
}

/// Why a spool line could not be read.
#[derive(Debug)]
enum LineFault {
    Read(io::Error),
    /// Over the limit, or the last line lacks its newline. Carries the 1-based line number.
    TooLong(usize),
}

impl LineFault {
    fn into_error(self, path: &Path) -> MessageError {
        match self {
            Self::Read(source) => MessageError::Read {
                path: path.to_path_buf(),
                source,
            },
            Self::TooLong(line) => MessageError::LineTooLong {
                path: path.to_path_buf(),
                line,
            },
        }
    }
}

/// Line reader over a spool file with a per-line length limit.
struct SpoolReader {
    reader: BufReader<File>,
    limit: u64,
    line_no: usize,
    buf: Vec<u8>,
}

impl SpoolReader {
    async fn open(path: &Path, max_line: usize) -> io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            reader: BufReader::new(file),
            limit: u64::try_from(max_line).unwrap_or(u64::MAX),
            line_no: 0,
            buf: Vec::new(),
        })
    }

    /// Returns the next line without its terminator, or `None` at end of file.
    async fn next_line(&mut self) -> std::result::Result<Option<&[u8]>, LineFault> {
        self.buf.clear();
        let n = (&mut self.reader)
            .take(self.limit)
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(LineFault::Read)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        if self.buf.last() != Some(&b'\n') {
            return Err(LineFault::TooLong(self.line_no));
        }
        Ok(Some(strip_terminator(&self.buf)))
    }
}

/// Reads the whole file once, checking every line's length and terminator.
async fn check_lines(path: &Path, max_line: usize) -> std::result::Result<(), MessageError> {
    let mut reader = SpoolReader::open(path, max_line)
        .await
        .map_err(|source| MessageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    while reader
        .next_line()
        .await
        .map_err(|fault| fault.into_error(path))?
        .is_some()
    {}
    Ok(())
}

impl<S> Session<'_, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Transmits one spool file.
    ///
    /// The file is checked locally before anything is sent, so a malformed
    /// line never reaches the server mid-message. Message-level failures
    /// come back as [`Delivery::Failed`]; only failures that leave the
    /// connection unusable are returned as errors.
    pub(super) async fn transmit(&mut self, path: &Path) -> Result<Delivery> {
        if let Err(e) = check_lines(path, self.config.max_spool_line).await {
            return Ok(Delivery::Failed(e));
        }
        let mut reader = match SpoolReader::open(path, self.config.max_spool_line).await {
            Ok(reader) => reader,
            Err(source) => {
                return Ok(Delivery::Failed(MessageError::Open {
                    path: path.to_path_buf(),
                    source,
                }));
            }
        };

        let mut state = EnvelopeState::AwaitingMail;
        // MAIL accepted and no terminator sent yet
        let mut open = false;

        loop {
            let line = match reader.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                // The file changed or failed since it was checked.
                Err(fault) => return self.abandon(state, open, fault.into_error(path)).await,
            };

            let (next, action) = match state.advance(line) {
                Ok(transition) => transition,
                Err(expected) => {
                    let error = MessageError::Envelope {
                        path: path.to_path_buf(),
                        expected,
                    };
                    return self.abandon(state, open, error).await;
                }
            };

            match action {
                LineAction::Text => {
                    tracing::trace!("C: {}", String::from_utf8_lossy(line));
                    self.channel
                        .write_line(&dot_stuff(line), self.config.write_timeout)
                        .await?;
                }
                LineAction::Command(step) => {
                    tracing::debug!("C: {}", String::from_utf8_lossy(line));
                    self.channel
                        .write_line(line, self.config.write_timeout)
                        .await?;
                    let reply = self.read_final().await?;
                    if !reply.is_positive() {
                        let error = MessageError::rejected(step, &reply);
                        // A refused DATA leaves the server in the envelope phase.
                        return self.abandon(state, open, error).await;
                    }
                    if step == Step::Mail {
                        open = true;
                    }
                }
            }
            state = next;
        }

        if !state.in_data() {
            let error = MessageError::Incomplete {
                path: path.to_path_buf(),
            };
            return self.abandon(state, open, error).await;
        }

        tracing::debug!("C: .");
        self.channel
            .write_line(b".", self.config.write_timeout)
            .await?;
        let reply = self.read_final().await?;
        if !reply.is_success() {
            return Ok(Delivery::Failed(MessageError::rejected(Step::Terminate, &reply)));
        }

        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "cannot remove sent message");
        }
        Ok(Delivery::Sent)
    }

    /// Gives up on the current message.
    ///
    /// Before `DATA` the server transaction is reset so the next message
    /// starts clean. Once text is flowing there is no way back short of
    /// the terminator, which would deliver a truncated message, so the
    /// session ends instead.
    async fn abandon(
        &mut self,
        state: EnvelopeState,
        open: bool,
        error: MessageError,
    ) -> Result<Delivery> {
        if state.in_data() {
            return Err(Error::MessageAborted(error));
        }
        if open {
            let reply = self.command(Command::Rset).await?;
            if !reply.is_success() {
                tracing::warn!(error = %MessageError::rejected(Step::Rset, &reply), "reset refused");
            }
        }
        Ok(Delivery::Failed(error))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn run(lines: &[&str]) -> std::result::Result<Vec<LineAction>, &'static str> {
        let mut state = EnvelopeState::AwaitingMail;
        let mut actions = Vec::new();
        for line in lines {
            let (next, action) = state.advance(line.as_bytes())?;
            state = next;
            actions.push(action);
        }
        Ok(actions)
    }

    #[test]
    fn full_envelope() {
        let actions = run(&[
            "MAIL FROM:<a@example.org>",
            "RCPT TO:<b@example.net>",
            "RCPT TO:<c@example.net>",
            "DATA",
            "Subject: hi",
            "",
            ".world",
        ])
        .unwrap_or_default();
        assert_eq!(
            actions,
            vec![
                LineAction::Command(Step::Mail),
                LineAction::Command(Step::Rcpt),
                LineAction::Command(Step::Rcpt),
                LineAction::Command(Step::Data),
                LineAction::Text,
                LineAction::Text,
                LineAction::Text,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert!(run(&["mail from:<a>", "Rcpt to:<b>", "data", "x"]).is_ok());
    }

    #[test]
    fn missing_mail() {
        assert_eq!(run(&["RCPT TO:<b>"]), Err("MAIL"));
    }

    #[test]
    fn missing_rcpt() {
        assert_eq!(run(&["MAIL FROM:<a>", "DATA"]), Err("RCPT"));
    }

    #[test]
    fn missing_data() {
        assert_eq!(run(&["MAIL FROM:<a>", "RCPT TO:<b>", "Hello"]), Err("DATA"));
    }

    #[test]
    fn rcpt_or_data_hands_line_to_data_rule() {
        let state = EnvelopeState::AwaitingRcptOrData;
        assert_eq!(
            state.advance(b"DATA"),
            Ok((EnvelopeState::DataStarted, LineAction::Command(Step::Data)))
        );
        assert_eq!(state.advance(b"Hello"), Err("DATA"));
    }

    #[test]
    fn data_started_hands_line_to_text() {
        let state = EnvelopeState::DataStarted;
        assert_eq!(
            state.advance(b"MAIL FROM:<looks like a command>"),
            Ok((EnvelopeState::InText, LineAction::Text))
        );
    }

    #[test]
    fn short_lines_never_match_keywords() {
        assert_eq!(EnvelopeState::AwaitingMail.advance(b"MAI"), Err("MAIL"));
        assert_eq!(EnvelopeState::AwaitingMail.advance(b""), Err("MAIL"));
    }

    #[test]
    fn in_data_states() {
        assert!(!EnvelopeState::AwaitingData.in_data());
        assert!(EnvelopeState::DataStarted.in_data());
        assert!(EnvelopeState::InText.in_data());
    }

    #[test]
    fn dot_stuffing() {
        assert_eq!(&*dot_stuff(b".world"), b"..world");
        assert_eq!(&*dot_stuff(b"."), b"..");
        assert_eq!(&*dot_stuff(b"hello."), b"hello.");
        assert_eq!(&*dot_stuff(b""), b"");
    }

    async fn check(content: &[u8], max_line: usize) -> std::result::Result<(), MessageError> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("msg");
        std::fs::write(&path, content).unwrap();
        check_lines(&path, max_line).await
    }

    #[tokio::test]
    async fn well_formed_file_passes_check() {
        let content = b"MAIL FROM:<a>\r\nRCPT TO:<b>\nDATA\nHello\n\n";
        assert!(check(content, 64).await.is_ok());
        assert!(check(b"", 64).await.is_ok());
    }

    #[tokio::test]
    async fn unterminated_last_line_fails_check() {
        let err = check(b"MAIL FROM:<a>\nRCPT TO:<b>\nDATA\nHello", 64)
            .await
            .unwrap_err();
        assert!(matches!(err, MessageError::LineTooLong { line: 4, .. }));
        assert!(err.is_structural());
    }

    #[tokio::test]
    async fn overlong_line_fails_check() {
        let content = format!("MAIL FROM:<a>\n{}\n", "x".repeat(100));
        let err = check(content.as_bytes(), 64).await.unwrap_err();
        assert!(matches!(err, MessageError::LineTooLong { line: 2, .. }));
    }

    #[tokio::test]
    async fn line_at_limit_passes_check() {
        // Seven characters plus the newline fill the limit exactly.
        assert!(check(b"abcdefg\n", 8).await.is_ok());
        assert!(check(b"abcdefgh\n", 8).await.is_err());
    }

    #[tokio::test]
    async fn missing_file_fails_check() {
        let dir = TempDir::new().unwrap();
        let err = check_lines(&dir.path().join("absent"), 64).await.unwrap_err();
        assert!(matches!(err, MessageError::Open { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 1024,
            ..ProptestConfig::default()
        })]

        #[test]
        fn stuffed_text_never_ends_data(line in "[x. ]{0,40}") {
            let stuffed = dot_stuff(line.as_bytes());
            prop_assert_ne!(&*stuffed, b".".as_slice());

            let unstuffed = if line.starts_with('.') {
                &stuffed[1..]
            } else {
                &stuffed[..]
            };
            prop_assert_eq!(unstuffed, line.as_bytes());
        }
    }
}
