//! REST log store — inserts one JSON row via `POST {url}/{table}`
//! (PostgREST-style endpoints such as hosted Postgres row APIs).

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::{LogRecord, LogStoreError};

#[derive(Debug, Clone)]
pub struct RestLogStore {
    client: Client,
    insert_url: String,
    api_key: String,
}

impl RestLogStore {
    pub fn new(
        base_url: String,
        table: &str,
        api_key: String,
        timeout_seconds: u64,
    ) -> Result<Self, LogStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| LogStoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        let insert_url = format!("{}/{table}", base_url.trim_end_matches('/'));
        Ok(Self { client, insert_url, api_key })
    }

    pub async fn insert(&self, record: &LogRecord) -> Result<(), LogStoreError> {
        debug!(url = %self.insert_url, "inserting log record");
        let response = self
            .client
            .post(&self.insert_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| LogStoreError::Write(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(LogStoreError::Write(format!("HTTP {status}: {body}")))
        }
    }
}
