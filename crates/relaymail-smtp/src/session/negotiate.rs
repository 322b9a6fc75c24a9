//! Greeting and EHLO/HELO negotiation.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Session;
use crate::command::{Command, Step};
use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

impl<S> Session<'_, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Absorbs the (possibly multiline) greeting; the last line must be 2xx.
    pub(super) async fn greet(&mut self) -> Result<()> {
        let greeting = self.read_final().await?;
        if !greeting.is_success() {
            return Err(Error::rejected(Step::Greeting, &greeting));
        }
        Ok(())
    }

    /// Sends EHLO, falling back to HELO on 500/502, and records the AUTH
    /// mechanisms announced in the EHLO reply.
    pub(super) async fn negotiate(&mut self) -> Result<()> {
        let hostname = self.config.client_name.clone();
        self.send(&Command::Ehlo {
            hostname: hostname.clone(),
        })
        .await?;
        let first = self.read_reply().await?;

        match first.code {
            ReplyCode::SYNTAX_ERROR | ReplyCode::NOT_IMPLEMENTED => {
                self.skip_rest(&first).await?;
                tracing::debug!("EHLO refused, falling back to HELO");
                let reply = self.command(Command::Helo { hostname }).await?;
                if !reply.is_success() {
                    return Err(Error::rejected(Step::Helo, &reply));
                }
            }
            ReplyCode::OK => {
                self.esmtp = true;
                self.scan_extension(&first);
                let mut more = first.more;
                while more {
                    let line = self.read_reply().await?;
                    if line.code != ReplyCode::OK {
                        return Err(Error::rejected(Step::Extensions, &line));
                    }
                    self.scan_extension(&line);
                    more = line.more;
                }
            }
            _ => return Err(Error::rejected(Step::Ehlo, &first)),
        }

        Ok(())
    }

    /// Reads and drops the remaining lines of a multiline reply.
    async fn skip_rest(&mut self, first: &Reply) -> Result<()> {
        if first.more {
            self.read_final().await?;
        }
        Ok(())
    }

    /// Feeds an `AUTH` extension line to the mechanism selection.
    /// Other extensions are ignored.
    fn scan_extension(&mut self, line: &Reply) {
        if let Some(mechanisms) = auth_mechanisms(line.text()) {
            tracing::debug!("server offers AUTH {}", mechanisms.trim());
            self.auth.absorb(mechanisms);
        }
    }
}

/// Returns the mechanism list if `text` is an `AUTH` extension line.
fn auth_mechanisms(text: &str) -> Option<&str> {
    let text = text.trim_start_matches([' ', '\t']);
    let (keyword, rest) = text
        .split_once(|c: char| c.is_ascii_whitespace())
        .unwrap_or((text, ""));
    keyword.eq_ignore_ascii_case("AUTH").then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_auth_lines() {
        assert_eq!(auth_mechanisms("AUTH LOGIN PLAIN"), Some("LOGIN PLAIN"));
        assert_eq!(auth_mechanisms("  auth\tPLAIN"), Some("PLAIN"));
        assert_eq!(auth_mechanisms("AUTH"), Some(""));
    }

    #[test]
    fn ignores_other_extensions() {
        assert_eq!(auth_mechanisms("SIZE 10240000"), None);
        assert_eq!(auth_mechanisms("AUTH=LOGIN"), None);
        assert_eq!(auth_mechanisms("AUTHX LOGIN"), None);
        assert_eq!(auth_mechanisms(""), None);
    }
}
