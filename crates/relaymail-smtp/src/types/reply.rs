//! SMTP reply types.

use crate::error::Result;

/// One reply line from the server.
///
/// A logical SMTP response may span several lines; every line but the
/// last carries a `-` after the status code (`more == true`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Status code from the first three characters.
    pub code: ReplyCode,
    /// True if further lines of the same response follow.
    pub more: bool,
    /// The raw line, without its terminator.
    pub line: String,
}

impl Reply {
    /// Parses one reply line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`](crate::Error::Protocol) if the line does
    /// not start with a three-digit status code.
    pub fn parse(line: &str) -> Result<Self> {
        crate::parser::parse_reply_line(line)
    }

    /// Returns the text after the status code and separator.
    #[must_use]
    pub fn text(&self) -> &str {
        self.line.get(4..).unwrap_or("")
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns true if this is a success or intermediate reply (2xx or 3xx).
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.code.is_positive()
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code.is_intermediate()
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line)
    }
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Returns true if this is a success or intermediate code (2xx or 3xx).
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.is_success() || self.is_intermediate()
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Codes the session branches on
impl ReplyCode {
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 500 Syntax error, command unrecognized
    pub const SYNTAX_ERROR: Self = Self(500);
    /// 502 Command not implemented
    pub const NOT_IMPLEMENTED: Self = Self(502);
}
