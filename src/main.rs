//! lanchat: multicast chat over the local network segment.
//!
//! Joins a 224.0.0.0/24 group on one interface and bridges it to the
//! terminal: stdin lines go out to the group, received datagrams are
//! printed with their sender address. `--robot` swaps stdin for a
//! synthetic generator that enqueues a counter payload every 100ms.

mod cli;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing::info;

use lanchat_transport::{Transport, TransportConfig};

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = TransportConfig::with_group_id(cli.group_id)?;
    config.port = cli.port;
    config.interface = cli.interface.clone();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let transport = Transport::join(&config)
            .await
            .context("failed to join multicast group")?;
        if cli.robot {
            run_robot(transport).await
        } else {
            run_chat(transport).await
        }
    })
}

/// Interactive consumer adapter: stdin lines out, inbound messages printed.
async fn run_chat(mut transport: Transport) -> Result<()> {
    let local = transport.local_addr();
    let outbound = transport.sender();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !line.is_empty() && outbound.send(line).is_err() {
                        break;
                    }
                }
                // stdin closed
                None => break,
            },
            message = transport.recv() => match message {
                Some(message) => {
                    if message.is_local_echo(local) {
                        println!("<{}> (you) {}", message.from, message.text);
                    } else {
                        println!("<{}> {}", message.from, message.text);
                    }
                }
                // receive loop terminated
                None => break,
            },
        }
    }

    transport.shutdown();
    transport.closed().await?;
    Ok(())
}

/// Synthetic consumer adapter: counter payloads at a fixed interval.
async fn run_robot(mut transport: Transport) -> Result<()> {
    let local = transport.local_addr();
    let outbound = transport.sender();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut counter: u64 = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                info!(payload = %counter, "enqueueing message");
                if outbound.send(counter.to_string()).is_err() {
                    break;
                }
                counter += 1;
            }
            message = transport.recv() => match message {
                Some(message) => info!(
                    from = %message.from,
                    text = %message.text,
                    own = message.is_local_echo(local),
                    "dequeued message"
                ),
                None => break,
            },
        }
    }

    transport.shutdown();
    transport.closed().await?;
    Ok(())
}
