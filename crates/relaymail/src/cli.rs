//! Command line arguments.

use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use relaymail_smtp::MessageSource;
use relaymail_smtp::config::DEFAULT_PORT;

/// Environment variable naming the default spool directory.
pub const SPOOL_ENV: &str = "SMTP";

/// Deliver spooled mail files to an SMTP relay.
#[derive(Debug, Parser)]
#[command(name = "relaymail", version, about)]
pub struct Args {
    /// SMTP server to connect to
    #[arg(short, long, value_name = "SERVER")]
    pub server: Option<String>,

    /// Server port
    #[arg(short = 'P', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Spool directory; every regular file in it is a message (repeatable)
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    pub directories: Vec<PathBuf>,

    /// Ask the server to run its queue for DOMAIN instead of sending mail
    #[arg(short = 'e', long, value_name = "DOMAIN")]
    pub etrn: Option<String>,

    /// Username for SMTP AUTH
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password for SMTP AUTH
    #[arg(short, long)]
    pub password: Option<String>,

    /// Do not print the connection banner
    #[arg(short, long)]
    pub quiet: bool,

    /// Print progress and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Append log output to this file as well
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Message files to send
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// What a run should do, once the arguments are validated.
#[derive(Debug, PartialEq, Eq)]
pub enum Job {
    /// Send ETRN for a domain.
    Etrn(String),
    /// Transmit the messages of a source.
    Deliver(MessageSource),
}

impl Args {
    /// Validates the arguments and works out the job.
    ///
    /// `spool_env` is the value of [`SPOOL_ENV`], used when neither files
    /// nor directories were given. An empty username or password counts as
    /// missing, so `-u user -p ""` is rejected.
    pub fn job(&self, spool_env: Option<PathBuf>) -> anyhow::Result<Job> {
        if self.server().is_none() {
            bail!("server must be specified using -s");
        }

        if self.username().is_some() != self.password().is_some() {
            bail!("neither or both of username and password must be specified");
        }

        if let Some(domain) = self.etrn.as_deref().filter(|d| !d.is_empty()) {
            if !self.files.is_empty() || !self.directories.is_empty() {
                bail!("cannot send mail at same time as ETRN");
            }
            return Ok(Job::Etrn(domain.to_string()));
        }

        let mut source = MessageSource::new();
        for file in &self.files {
            source.push_file(file);
        }
        for dir in &self.directories {
            source.push_directory(dir);
        }
        if source.is_empty() {
            let Some(dir) = spool_env else {
                bail!("no files specified, and environment variable {SPOOL_ENV} not set");
            };
            source.push_directory(dir);
        }
        Ok(Job::Deliver(source))
    }

    /// Server name, if one was given.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref().filter(|s| !s.is_empty())
    }

    /// Username and password, if both were given.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username().zip(self.password())
    }

    fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }

    fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}
