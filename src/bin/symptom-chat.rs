//! Terminal chat client for the symptom relay.
//!
//! Reads lines from stdin, sends them to the relay and prints the transcript
//! as bubbles. The transcript survives restarts via the configured
//! transcript file. Diagnostics go to the client log file, not the screen.
//!
//! Commands: `/reset`, `/status`, `/help`, `/quit`.

use std::io::Write as _;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use symptom_relay::client::probe::spawn_probe;
use symptom_relay::client::{
    ChatSession, ConnectionStatus, FileTranscriptStore, RelayClient, render,
};
use symptom_relay::error::AppError;
use symptom_relay::{config, logger};

const HELP: &str = "Commands: /reset (new conversation), /status (relay status), /help, /quit";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::parse_level(&config.log_level)?;
    logger::init(&config.log_level, false, Some(&config.client.log_file))?;

    let c = &config.client;
    let relay = RelayClient::new(&c.relay_url, c.request_timeout_seconds, c.probe_timeout_seconds)
        .map_err(|e| AppError::Client(e.to_string()))?;
    let store = FileTranscriptStore::new(&c.transcript_file);
    info!(relay_url = %relay.url(), transcript = %store.path().display(), "chat client starting");

    let mut session = ChatSession::initialize(store);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    // With probing disabled the sender is dropped at once and the status
    // branch below is never taken.
    let (mut status_rx, probe_handle) = if c.probe_interval_seconds > 0 {
        let (rx, handle) = spawn_probe(
            relay.clone(),
            Duration::from_secs(c.probe_interval_seconds),
            shutdown.clone(),
        );
        (rx, Some(handle))
    } else {
        let (_, rx) = watch::channel(ConnectionStatus::Unknown);
        (rx, None)
    };

    println!("─────────────────────────────────");
    println!(" Symptom chat  ({HELP})");
    println!("─────────────────────────────────");
    println!("{}\n", render::transcript(session.transcript()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                break;
            }

            Ok(()) = status_rx.changed() => {
                let status = *status_rx.borrow_and_update();
                session.set_connection(status);
                println!("\n{}", render::status_line(status, session.is_loading()));
            }

            line = lines.next_line() => {
                let input = match line {
                    Err(e) => {
                        warn!("stdin read error: {e}");
                        break;
                    }
                    Ok(None) => break,
                    Ok(Some(input)) => input,
                };

                match input.trim() {
                    "" => continue,
                    "/quit" | "/exit" => break,
                    "/help" => println!("{HELP}"),
                    "/status" => println!("{}", render::status_line(session.connection(), session.is_loading())),
                    "/reset" => {
                        session.reset();
                        println!("{}\n", render::transcript(session.transcript()));
                    }
                    text => {
                        debug!(len = text.len(), "submitting");
                        println!("{}", render::status_line(session.connection(), true));
                        if let Some(reply) = session.submit(text, &relay).await {
                            println!("\n{}\n", render::bubble(reply));
                        }
                    }
                }
            }
        }
    }

    shutdown.cancel();
    if let Some(handle) = probe_handle {
        let _ = handle.await;
    }
    info!("chat client exiting");
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
