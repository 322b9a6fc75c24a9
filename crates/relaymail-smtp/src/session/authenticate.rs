//! SMTP AUTH with LOGIN or PLAIN.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Session;
use crate::codec;
use crate::command::{Command, Step};
use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::types::{AuthSelection, Mechanism};

impl<S> Session<'_, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Authenticates if credentials were configured.
    ///
    /// Without credentials nothing is sent, whatever the server offered.
    pub(super) async fn authenticate(&mut self) -> Result<()> {
        let Some(credentials) = self.config.credentials.clone() else {
            return Ok(());
        };

        match self.auth.clone() {
            AuthSelection::Selected(Mechanism::Login) => self.auth_login(&credentials).await,
            AuthSelection::Selected(Mechanism::Plain) => self.auth_plain(&credentials).await,
            AuthSelection::Unsupported { offered } => Err(Error::AuthUnsupported { offered }),
            AuthSelection::NotOffered => {
                if self.esmtp {
                    tracing::warn!("server offers no AUTH mechanism; continuing without authentication");
                } else {
                    tracing::warn!("server does not support EHLO; continuing without authentication");
                }
                Ok(())
            }
        }
    }

    async fn auth_login(&mut self, credentials: &Credentials) -> Result<()> {
        let reply = self
            .command(Command::Auth {
                mechanism: Mechanism::Login,
                initial_response: None,
            })
            .await?;
        if !reply.is_intermediate() {
            return Err(Error::rejected(Step::AuthLogin, &reply));
        }

        let username = codec::encode(credentials.username().as_bytes());
        let reply = self.command(Command::Credential(username)).await?;
        if !reply.is_intermediate() {
            return Err(Error::rejected(Step::AuthLoginUsername, &reply));
        }

        let password = codec::encode(credentials.password().as_bytes());
        let reply = self.command(Command::Credential(password)).await?;
        if !reply.is_positive() {
            return Err(Error::rejected(Step::AuthLoginPassword, &reply));
        }

        tracing::debug!("authenticated with LOGIN");
        Ok(())
    }

    async fn auth_plain(&mut self, credentials: &Credentials) -> Result<()> {
        let initial_response = codec::plain_response(credentials.username(), credentials.password());
        let reply = self
            .command(Command::Auth {
                mechanism: Mechanism::Plain,
                initial_response: Some(initial_response),
            })
            .await?;
        if !reply.is_positive() {
            return Err(Error::rejected(Step::AuthPlain, &reply));
        }

        tracing::debug!("authenticated with PLAIN");
        Ok(())
    }
}
