//! HTTP client for the relay endpoint.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::http::wire::{AnswerRequest, AnswerResponse, ErrorResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("relay unreachable: {0}")]
    Transport(String),
    #[error("relay request timed out")]
    Timeout,
    #[error("relay returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected relay response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// Advisory reachability, shown next to the transcript. Never gates submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Anything that can answer a user turn. [`RelayClient`] in production.
pub trait RelayApi {
    fn answer(&self, message: &str) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// Cheap to clone — `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    url: String,
    probe_timeout: Duration,
}

impl RelayClient {
    pub fn new(
        url: impl Into<String>,
        request_timeout_seconds: u64,
        probe_timeout_seconds: u64,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_seconds))
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            probe_timeout: Duration::from_secs(probe_timeout_seconds),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `GET` the relay endpoint with the short probe timeout.
    pub async fn probe(&self) -> ConnectionStatus {
        match self.client.get(&self.url).timeout(self.probe_timeout).send().await {
            Ok(resp) if resp.status().is_success() => ConnectionStatus::Connected,
            Ok(resp) => {
                debug!(status = %resp.status(), "probe got non-success status");
                ConnectionStatus::Disconnected
            }
            Err(e) => {
                debug!(error = %e, "probe failed");
                ConnectionStatus::Disconnected
            }
        }
    }

    async fn post(&self, message: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(&self.url)
            .json(&AnswerRequest::new(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ClientError::Status { status: status.as_u16(), message });
        }

        let parsed = response.json::<AnswerResponse>().await?;
        if parsed.reply.trim().is_empty() {
            return Err(ClientError::Decode("empty reply".into()));
        }
        Ok(parsed.reply)
    }
}

impl RelayApi for RelayClient {
    fn answer(&self, message: &str) -> impl Future<Output = Result<String, ClientError>> + Send {
        self.post(message)
    }
}
