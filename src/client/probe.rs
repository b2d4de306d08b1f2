//! Background reachability probe.
//!
//! Runs on its own task, independent of submissions, and publishes through a
//! `watch` channel only when the status changes. It never touches the
//! transcript.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::relay_client::{ConnectionStatus, RelayClient};

/// Probe immediately, then every `interval`, until `shutdown` is cancelled.
pub fn spawn_probe(
    client: RelayClient,
    interval: Duration,
    shutdown: CancellationToken,
) -> (watch::Receiver<ConnectionStatus>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(ConnectionStatus::Unknown);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                _ = ticker.tick() => {
                    let status = client.probe().await;
                    let changed = tx.send_if_modified(|current| {
                        if *current == status {
                            false
                        } else {
                            *current = status;
                            true
                        }
                    });
                    if changed {
                        debug!(status = status.label(), "connection status changed");
                    }
                }
            }
        }
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};

    #[tokio::test]
    async fn reports_connected_then_stops_on_shutdown() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new().route("/", get(|| async { StatusCode::OK }));
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let client = RelayClient::new(format!("http://{addr}/"), 2, 1).unwrap();
        let shutdown = CancellationToken::new();
        let (mut rx, handle) = spawn_probe(client, Duration::from_secs(60), shutdown.clone());

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionStatus::Connected);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_relay_reports_disconnected() {
        let client = RelayClient::new("http://127.0.0.1:1/", 1, 1).unwrap();
        let shutdown = CancellationToken::new();
        let (mut rx, handle) = spawn_probe(client, Duration::from_secs(60), shutdown.clone());

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionStatus::Disconnected);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
