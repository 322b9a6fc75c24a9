//! SMTP reply line parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Continuation marker in the fourth column of a reply line.
pub const CONTINUATION: u8 = b'-';

/// Parses a single reply line (terminator already removed).
///
/// Reply lines look like:
/// - Final: `250 OK`
/// - Continued: `250-SIZE 10240000`
/// - Bare code: `250`
///
/// # Errors
///
/// Returns an error if the line does not start with three ASCII digits.
pub fn parse_reply_line(line: &str) -> Result<Reply> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 {
        return Err(Error::Protocol(format!("Reply too short: {line}")));
    }

    let digits = &bytes[..3];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::Protocol(format!("Invalid reply code: {line}")));
    }

    let code = digits
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));

    Ok(Reply {
        code: ReplyCode::new(code),
        more: has_continuation(line),
        line: line.to_string(),
    })
}

/// Checks if more lines of the same response follow this one.
#[must_use]
pub fn has_continuation(line: &str) -> bool {
    line.as_bytes().get(3) == Some(&CONTINUATION)
}
