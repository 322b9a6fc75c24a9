//! TCP connection setup.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;

use super::LineChannel;
use crate::error::{Error, Result};

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if name resolution or the connection fails, or if it
/// does not complete within `timeout`.
pub async fn connect(hostname: &str, port: u16, timeout: Duration) -> Result<LineChannel<TcpStream>> {
    let addr = format!("{hostname}:{port}");
    let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connection to {addr} timed out"),
            ))
        })??;
    tracing::debug!(%addr, "connected");
    Ok(LineChannel::new(stream))
}

/// Formats an address literal (`[192.0.2.1]`, `[IPv6:2001:db8::1]`) for EHLO.
///
/// Used when the local host has no usable name.
#[must_use]
pub fn address_literal(addr: &SocketAddr) -> String {
    match addr {
        SocketAddr::V4(v4) => format!("[{}]", v4.ip()),
        SocketAddr::V6(v6) => format!("[IPv6:{}]", v6.ip()),
    }
}
