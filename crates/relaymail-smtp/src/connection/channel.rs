//! Line-oriented duplex channel with per-operation timeouts.
//!
//! SMTP is a line protocol in both directions. Every read yields exactly
//! one line and every read or write is bounded by a timeout, so a stalled
//! server surfaces as an error instead of a hang.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Buffered line channel over any async byte stream.
#[derive(Debug)]
pub struct LineChannel<S> {
    reader: BufReader<S>,
}

impl<S> LineChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new channel over `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
        }
    }

    /// Reads one LF- or CRLF-terminated line, without its terminator.
    ///
    /// `max_len` bounds the line including its terminator.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadTimeout`] if no complete line arrives within `timeout`
    /// - [`Error::LineTooLong`] if the line exceeds `max_len`
    /// - [`Error::Io`] on a read failure, or if the peer closes the connection
    pub async fn read_line(&mut self, max_len: usize, timeout: Duration) -> Result<String> {
        let mut line = Vec::new();
        let limit = u64::try_from(max_len).unwrap_or(u64::MAX);
        let reader = &mut self.reader;

        let read = async {
            let mut limited = reader.take(limit);
            limited.read_until(b'\n', &mut line).await
        };
        let n = tokio::time::timeout(timeout, read)
            .await
            .map_err(|_| Error::ReadTimeout(timeout))??;

        if n == 0 {
            return Err(connection_closed());
        }

        if line.last() != Some(&b'\n') {
            if line.len() >= max_len {
                return Err(Error::LineTooLong(max_len));
            }
            return Err(connection_closed());
        }

        let content = strip_terminator(&line);
        let text = String::from_utf8_lossy(content).into_owned();
        tracing::debug!("S: {text}");
        Ok(text)
    }

    /// Writes raw bytes and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteTimeout`] if the write does not complete in time,
    /// or [`Error::Io`] if it fails.
    pub async fn write_all(&mut self, data: &[u8], timeout: Duration) -> Result<()> {
        let stream = self.reader.get_mut();
        let write = async {
            stream.write_all(data).await?;
            stream.flush().await
        };
        tokio::time::timeout(timeout, write)
            .await
            .map_err(|_| Error::WriteTimeout(timeout))??;
        Ok(())
    }

    /// Writes `line` followed by CRLF.
    ///
    /// # Errors
    ///
    /// Same as [`write_all`](Self::write_all).
    pub async fn write_line(&mut self, line: &[u8], timeout: Duration) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line);
        data.extend_from_slice(b"\r\n");
        self.write_all(&data, timeout).await
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Consumes the channel, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Strips a trailing LF or CRLF.
pub(crate) fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn connection_closed() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "connection closed",
    ))
}
