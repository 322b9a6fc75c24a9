//! Session configuration types.

use std::time::Duration;

/// Default SMTP port.
pub const DEFAULT_PORT: u16 = 25;

/// Default limit for a server reply line, in bytes.
pub const DEFAULT_MAX_REPLY_LINE: usize = 1000;

/// Default limit for a spool file line, in bytes.
pub const DEFAULT_MAX_SPOOL_LINE: usize = 2002;

/// Default read/write timeout.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Username and password for SMTP AUTH.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials, or `None` if the username is empty.
    ///
    /// An empty username means no authentication is attempted.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Option<Self> {
        let username = username.into();
        if username.is_empty() {
            return None;
        }
        Some(Self {
            username,
            password: password.into(),
        })
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for one SMTP session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name sent with EHLO/HELO.
    pub client_name: String,
    /// Credentials for AUTH, if any.
    pub credentials: Option<Credentials>,
    /// Domain to send ETRN for instead of transmitting messages.
    pub etrn_domain: Option<String>,
    /// Timeout for each reply line.
    pub read_timeout: Duration,
    /// Timeout for each line written.
    pub write_timeout: Duration,
    /// Longest reply line accepted from the server.
    pub max_reply_line: usize,
    /// Longest spool file line accepted.
    pub max_spool_line: usize,
}

impl SessionConfig {
    /// Creates a configuration with defaults and no authentication.
    #[must_use]
    pub fn new(client_name: impl Into<String>) -> Self {
        Self::builder(client_name).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(client_name: impl Into<String>) -> SessionConfigBuilder {
        SessionConfigBuilder::new(client_name)
    }
}

/// Builder for session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    client_name: String,
    credentials: Option<Credentials>,
    etrn_domain: Option<String>,
    read_timeout: Duration,
    write_timeout: Duration,
    max_reply_line: usize,
    max_spool_line: usize,
}

impl SessionConfigBuilder {
    /// Creates a new builder with the given client name.
    #[must_use]
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            credentials: None,
            etrn_domain: None,
            read_timeout: DEFAULT_IO_TIMEOUT,
            write_timeout: DEFAULT_IO_TIMEOUT,
            max_reply_line: DEFAULT_MAX_REPLY_LINE,
            max_spool_line: DEFAULT_MAX_SPOOL_LINE,
        }
    }

    /// Sets the credentials. An empty username disables authentication.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Credentials::new(username, password);
        self
    }

    /// Requests ETRN for `domain` instead of sending messages.
    ///
    /// An empty domain is ignored.
    #[must_use]
    pub fn etrn(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        self.etrn_domain = (!domain.is_empty()).then_some(domain);
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    #[must_use]
    pub const fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the reply line limit.
    #[must_use]
    pub const fn max_reply_line(mut self, limit: usize) -> Self {
        self.max_reply_line = limit;
        self
    }

    /// Sets the spool line limit.
    #[must_use]
    pub const fn max_spool_line(mut self, limit: usize) -> Self {
        self.max_spool_line = limit;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> SessionConfig {
        SessionConfig {
            client_name: self.client_name,
            credentials: self.credentials,
            etrn_domain: self.etrn_domain,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            max_reply_line: self.max_reply_line,
            max_spool_line: self.max_spool_line,
        }
    }
}
