//! `relaymail` - deliver spooled mail files to an SMTP relay.
//!
//! Each run makes one connection: it either transmits every pending spool
//! file, or sends a single ETRN request for a domain.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tokio::net::TcpStream;
use tracing::info;

use relaymail_smtp::config::DEFAULT_IO_TIMEOUT;
use relaymail_smtp::connection::address_literal;
use relaymail_smtp::{SessionConfig, SessionResult, connect, has_pending_work, run_session};

use cli::{Args, Job, SPOOL_ENV};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init(args.verbose, args.log_file.as_deref()) {
        eprintln!("relaymail: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("relaymail: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Performs one run. Returns whether the session succeeded.
async fn run(args: &Args) -> anyhow::Result<bool> {
    let job = args.job(std::env::var_os(SPOOL_ENV).map(PathBuf::from))?;
    let server = args.server().context("server must be specified using -s")?;

    let messages = match &job {
        Job::Etrn(_) => Vec::new(),
        Job::Deliver(source) => {
            if !has_pending_work(source).await {
                if args.verbose {
                    println!("No mail to send");
                }
                return Ok(true);
            }
            source.messages().await
        }
    };

    let mut channel = connect(server, args.port, DEFAULT_IO_TIMEOUT)
        .await
        .with_context(|| format!("cannot connect to SMTP server '{server}'"))?;

    if !args.quiet {
        println!(
            "relaymail: connection to {server}, {}",
            Local::now().format("on %a %d %b %Y at %X %Z")
        );
    }
    info!("connection to {server}");

    let mut config = SessionConfig::builder(client_name(channel.get_ref())?);
    if let Some((username, password)) = args.credentials() {
        config = config.credentials(username, password);
    }
    if let Job::Etrn(domain) = &job {
        config = config.etrn(domain.as_str());
    }
    let config = config.build();

    let result = run_session(&mut channel, &messages, &config).await;
    report(args, &config, &result);
    Ok(result.success)
}

/// Name announced in EHLO/HELO: the host name, else the local address literal.
fn client_name(stream: &TcpStream) -> anyhow::Result<String> {
    if let Some(name) = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
    {
        return Ok(name);
    }
    let local = stream
        .local_addr()
        .context("cannot determine local address")?;
    Ok(address_literal(&local))
}

fn report(args: &Args, config: &SessionConfig, result: &SessionResult) {
    if let Some(e) = &result.error {
        eprintln!("relaymail: {e}");
    }
    if !args.verbose {
        return;
    }
    match &config.etrn_domain {
        Some(domain) if result.etrn_requested => println!("ETRN sent for {domain}"),
        Some(_) => {}
        None => println!(
            "{} message{} transmitted",
            result.messages_sent,
            if result.messages_sent == 1 { "" } else { "s" }
        ),
    }
}
