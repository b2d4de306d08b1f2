//! The answer pipeline: search → prompt → inference → (background) log.
//!
//! [`Relay::answer`] is the single operation. Phases run sequentially; only
//! inference can fail the request. Search failures degrade to an empty
//! context and log-store failures are swallowed after the reply is returned.

pub mod prompt;

use chrono::Utc;
use thiserror::Error;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::llm::{self, LlmProvider};
use crate::logstore::{self, LogRecord, LogStore};
use crate::search::{self, SearchContext, SearchProvider};

use prompt::PromptTemplates;

// ── Error ─────────────────────────────────────────────────────────────────────

/// Errors surfaced to relay callers. Everything else is absorbed.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("message required")]
    MessageRequired,
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("failed to generate response: {0}")]
    Inference(String),
}

// ── Relay ─────────────────────────────────────────────────────────────────────

/// Stateless across requests; share it behind an `Arc`.
pub struct Relay {
    search: SearchProvider,
    llm: LlmProvider,
    log_store: Option<LogStore>,
    prompts: PromptTemplates,
    assistant_name: String,
    log_tasks: TaskTracker,
}

impl Relay {
    pub fn new(
        search: SearchProvider,
        llm: LlmProvider,
        prompts: PromptTemplates,
        assistant_name: impl Into<String>,
    ) -> Self {
        Self {
            search,
            llm,
            log_store: None,
            prompts,
            assistant_name: assistant_name.into(),
            log_tasks: TaskTracker::new(),
        }
    }

    pub fn with_log_store(mut self, log_store: Option<LogStore>) -> Self {
        self.log_store = log_store;
        self
    }

    /// Build every collaborator from config.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let search = search::providers::build(&config.search, config.search_api_key.clone())
            .map_err(|e| AppError::Config(e.to_string()))?;
        let llm = llm::providers::build(&config.llm, config.llm_api_key.clone())
            .map_err(|e| AppError::Config(e.to_string()))?;
        let log_store = logstore::build(
            &config.log_store,
            config.log_store_enabled,
            config.log_store_key.clone(),
        )
        .map_err(|e| AppError::Config(e.to_string()))?;
        let prompts = PromptTemplates::load(config.relay.prompts_dir.as_deref());

        info!(
            search = search.name(),
            llm = llm.name(),
            log_store = log_store.as_ref().map(LogStore::name).unwrap_or("disabled"),
            "relay pipeline ready"
        );

        Ok(Self::new(search, llm, prompts, config.relay.assistant_name.clone())
            .with_log_store(log_store))
    }

    /// Answer one free-text query.
    ///
    /// Search and prompt see the trimmed text; the log record keeps the
    /// query exactly as submitted.
    pub async fn answer(&self, submitted: &str) -> Result<String, RelayError> {
        let query = submitted.trim();
        if query.is_empty() {
            return Err(RelayError::MessageRequired);
        }
        self.search
            .ensure_configured()
            .map_err(|e| RelayError::Configuration(e.to_string()))?;

        let context = self.search_phase(query).await.format();
        let request = self.prompts.build(&self.assistant_name, Utc::now().date_naive(), &context, query);

        let reply = self.llm.complete(&request).await.map_err(|e| {
            warn!(error = %e, "inference failed");
            RelayError::Inference(e.to_string())
        })?;

        self.log_exchange(submitted, &reply, &context);
        Ok(reply)
    }

    async fn search_phase(&self, query: &str) -> SearchContext {
        match self.search.search(query).await {
            Ok(ctx) => {
                debug!(hits = ctx.hits().len(), "search phase done");
                ctx
            }
            Err(e) => {
                warn!(error = %e, "search failed — continuing without web results");
                SearchContext::default()
            }
        }
    }

    /// Fire-and-forget; the handler never waits on this.
    fn log_exchange(&self, query: &str, reply: &str, context: &str) {
        let Some(store) = self.log_store.clone() else {
            return;
        };
        let record = LogRecord::now(query, reply, context);
        self.log_tasks.spawn(async move {
            if let Err(e) = store.insert(record).await {
                warn!(store = store.name(), error = %e, "log store write failed");
            }
        });
    }

    /// Wait for every in-flight log write. Called on shutdown and by tests.
    pub async fn flush_logs(&self) {
        self.log_tasks.close();
        self.log_tasks.wait().await;
        self.log_tasks.reopen();
    }
}
