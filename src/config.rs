//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the file named by `SYMPTOM_RELAY_CONFIG`), then applies the
//! `SYMPTOM_RELAY_*` env overrides. Provider credentials are only ever read
//! from the environment, never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Backend relay HTTP settings (`[relay]`).
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address the relay listens on.
    pub bind: String,
    /// Route serving `GET` (liveness) and `POST` (answer).
    pub path: String,
    /// Upper bound for one whole `POST` (search + inference).
    pub request_timeout_seconds: u64,
    /// Optional directory whose `system.md` / `user.md` replace the built-in templates.
    pub prompts_dir: Option<PathBuf>,
    /// Persona name substituted into the system instruction.
    pub assistant_name: String,
}

/// A canned search result used by the `static` provider.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StaticHit {
    pub title: String,
    pub snippet: String,
}

/// Web search settings (`[search]`).
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// `"serper"`, `"static"` or `"none"`.
    pub provider: String,
    pub api_url: String,
    pub max_results: usize,
    pub timeout_seconds: u64,
    /// Results served by the `static` provider.
    pub static_results: Vec<StaticHit>,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    /// Maximum output length requested from the provider.
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"dummy"` or `"openai"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
}

/// Which log store backend receives exchange records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStoreBackend {
    None,
    Sqlite,
    Rest,
}

/// Optional exchange log (`[log_store]`).
#[derive(Debug, Clone)]
pub struct LogStoreConfig {
    pub backend: LogStoreBackend,
    /// SQLite database file (already resolved against `work_dir`).
    pub path: PathBuf,
    /// Insert endpoint for the `rest` backend.
    pub url: Option<String>,
    pub table: String,
    pub timeout_seconds: u64,
}

/// Terminal chat client settings (`[client]`).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the relay endpoint.
    pub relay_url: String,
    /// Transcript persistence file (already resolved against `work_dir`).
    pub transcript_file: PathBuf,
    /// Client log file; keeps diagnostics off the chat screen.
    pub log_file: PathBuf,
    pub request_timeout_seconds: u64,
    /// Seconds between background reachability probes; `0` disables probing.
    pub probe_interval_seconds: u64,
    pub probe_timeout_seconds: u64,
}

/// Fully-resolved configuration shared by both binaries.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    pub relay: RelayConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub log_store: LogStoreConfig,
    pub client: ClientConfig,
    /// From `SEARCH_API_KEY`. Required by the `serper` provider.
    pub search_api_key: Option<String>,
    /// From `LLM_API_KEY` — `None` for keyless local models.
    pub llm_api_key: Option<String>,
    /// From `LOG_STORE_KEY`. Required by the `rest` log store.
    pub log_store_key: Option<String>,
    /// Resolved once here: a backend is selected and its credential is present.
    pub log_store_enabled: bool,
}

/// Values taken from the process environment.
///
/// Tests build this directly instead of mutating env vars.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub work_dir: Option<String>,
    pub log_level: Option<String>,
    pub bind: Option<String>,
    pub relay_url: Option<String>,
    pub search_api_key: Option<String>,
    pub llm_api_key: Option<String>,
    pub log_store_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            work_dir: env::var("SYMPTOM_RELAY_WORK_DIR").ok(),
            log_level: env::var("SYMPTOM_RELAY_LOG_LEVEL").ok(),
            bind: env::var("SYMPTOM_RELAY_BIND").ok(),
            relay_url: env::var("SYMPTOM_RELAY_URL").ok(),
            search_api_key: non_empty(env::var("SEARCH_API_KEY").ok()),
            llm_api_key: non_empty(env::var("LLM_API_KEY").ok()),
            log_store_key: non_empty(env::var("LOG_STORE_KEY").ok()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawConfig {
    relay: RawRelay,
    #[serde(default)]
    search: RawSearch,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    log_store: RawLogStore,
    #[serde(default)]
    client: RawClient,
}

#[derive(Deserialize)]
struct RawRelay {
    work_dir: String,
    log_level: String,
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_path")]
    path: String,
    #[serde(default = "default_request_timeout_seconds")]
    request_timeout_seconds: u64,
    #[serde(default)]
    prompts_dir: Option<String>,
    #[serde(default = "default_assistant_name")]
    assistant_name: String,
}

#[derive(Deserialize)]
struct RawSearch {
    #[serde(default = "default_search_provider")]
    provider: String,
    #[serde(default = "default_search_api_url")]
    api_url: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
    #[serde(default = "default_search_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default)]
    static_results: Vec<StaticHit>,
}

impl Default for RawSearch {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            api_url: default_search_api_url(),
            max_results: default_max_results(),
            timeout_seconds: default_search_timeout_seconds(),
            static_results: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            max_tokens: default_openai_max_tokens(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawLogStore {
    #[serde(default = "default_log_store_backend")]
    backend: LogStoreBackend,
    #[serde(default = "default_log_store_path")]
    path: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default = "default_log_store_table")]
    table: String,
    #[serde(default = "default_log_store_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawLogStore {
    fn default() -> Self {
        Self {
            backend: default_log_store_backend(),
            path: default_log_store_path(),
            url: None,
            table: default_log_store_table(),
            timeout_seconds: default_log_store_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawClient {
    #[serde(default)]
    relay_url: Option<String>,
    #[serde(default = "default_transcript_file")]
    transcript_file: String,
    #[serde(default = "default_client_log_file")]
    log_file: String,
    #[serde(default = "default_request_timeout_seconds")]
    request_timeout_seconds: u64,
    #[serde(default = "default_probe_interval_seconds")]
    probe_interval_seconds: u64,
    #[serde(default = "default_probe_timeout_seconds")]
    probe_timeout_seconds: u64,
}

impl Default for RawClient {
    fn default() -> Self {
        Self {
            relay_url: None,
            transcript_file: default_transcript_file(),
            log_file: default_client_log_file(),
            request_timeout_seconds: default_request_timeout_seconds(),
            probe_interval_seconds: default_probe_interval_seconds(),
            probe_timeout_seconds: default_probe_timeout_seconds(),
        }
    }
}

fn default_bind() -> String { "127.0.0.1:8787".to_string() }
fn default_path() -> String { "/".to_string() }
fn default_request_timeout_seconds() -> u64 { 60 }
fn default_assistant_name() -> String { "Symptom Assistant".to_string() }
fn default_search_provider() -> String { "serper".to_string() }
fn default_search_api_url() -> String { "https://google.serper.dev/search".to_string() }
fn default_max_results() -> usize { 5 }
fn default_search_timeout_seconds() -> u64 { 10 }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.3 }
fn default_openai_max_tokens() -> u32 { 1024 }
fn default_openai_timeout_seconds() -> u64 { 30 }
fn default_log_store_backend() -> LogStoreBackend { LogStoreBackend::None }
fn default_log_store_path() -> String { "chat-logs.sqlite".to_string() }
fn default_log_store_table() -> String { "chat_logs".to_string() }
fn default_log_store_timeout_seconds() -> u64 { 5 }
fn default_transcript_file() -> String { "chat-history.json".to_string() }
fn default_client_log_file() -> String { "symptom-chat.log".to_string() }
fn default_probe_interval_seconds() -> u64 { 30 }
fn default_probe_timeout_seconds() -> u64 { 5 }

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `config/default.toml` (or `SYMPTOM_RELAY_CONFIG`), then
/// apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let path = env::var("SYMPTOM_RELAY_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    load_from(Path::new(&path), &EnvOverrides::from_env())
}

/// Internal loader — accepts an explicit path and overrides.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let r = parsed.relay;

    let work_dir = expand_home(overrides.work_dir.as_deref().unwrap_or(&r.work_dir));
    let log_level = overrides.log_level.clone().unwrap_or(r.log_level);
    let bind = overrides.bind.clone().unwrap_or(r.bind);

    if !r.path.starts_with('/') {
        return Err(AppError::Config(format!("[relay].path must start with '/': {}", r.path)));
    }
    if parsed.search.max_results == 0 {
        return Err(AppError::Config("[search].max_results must be at least 1".into()));
    }

    let relay_url = overrides
        .relay_url
        .clone()
        .or(parsed.client.relay_url)
        .unwrap_or_else(|| format!("http://{bind}{}", r.path));

    let log_store_key = overrides.log_store_key.clone();
    let log_store_url = parsed.log_store.url;
    let log_store_enabled = match parsed.log_store.backend {
        LogStoreBackend::None => false,
        LogStoreBackend::Sqlite => true,
        LogStoreBackend::Rest => log_store_url.is_some() && log_store_key.is_some(),
    };

    Ok(Config {
        log_level,
        relay: RelayConfig {
            bind,
            path: r.path,
            request_timeout_seconds: r.request_timeout_seconds,
            prompts_dir: r.prompts_dir.map(|d| resolve_in(&work_dir, &d)),
            assistant_name: r.assistant_name,
        },
        search: SearchConfig {
            provider: parsed.search.provider,
            api_url: parsed.search.api_url,
            max_results: parsed.search.max_results,
            timeout_seconds: parsed.search.timeout_seconds,
            static_results: parsed.search.static_results,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                max_tokens: parsed.llm.openai.max_tokens,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        log_store: LogStoreConfig {
            backend: parsed.log_store.backend,
            path: resolve_in(&work_dir, &parsed.log_store.path),
            url: log_store_url,
            table: parsed.log_store.table,
            timeout_seconds: parsed.log_store.timeout_seconds,
        },
        client: ClientConfig {
            relay_url,
            transcript_file: resolve_in(&work_dir, &parsed.client.transcript_file),
            log_file: resolve_in(&work_dir, &parsed.client.log_file),
            request_timeout_seconds: parsed.client.request_timeout_seconds,
            probe_interval_seconds: parsed.client.probe_interval_seconds,
            probe_timeout_seconds: parsed.client.probe_timeout_seconds,
        },
        search_api_key: overrides.search_api_key.clone(),
        llm_api_key: overrides.llm_api_key.clone(),
        log_store_key,
        log_store_enabled,
        work_dir,
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Absolute (or `~`) paths stay as they are; relative ones land under `work_dir`.
fn resolve_in(work_dir: &Path, path: &str) -> PathBuf {
    let expanded = expand_home(path);
    if expanded.is_absolute() { expanded } else { work_dir.join(expanded) }
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Safe `Config` for tests — static search, dummy LLM, no log store,
    /// no API keys, no external calls.
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            relay: RelayConfig {
                bind: "127.0.0.1:0".into(),
                path: default_path(),
                request_timeout_seconds: 5,
                prompts_dir: None,
                assistant_name: default_assistant_name(),
            },
            search: SearchConfig {
                provider: "static".into(),
                api_url: "http://127.0.0.1:1/search".into(),
                max_results: default_max_results(),
                timeout_seconds: 1,
                static_results: Vec::new(),
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://127.0.0.1:1/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    max_tokens: 256,
                    timeout_seconds: 1,
                },
            },
            log_store: LogStoreConfig {
                backend: LogStoreBackend::None,
                path: work_dir.join(default_log_store_path()),
                url: None,
                table: default_log_store_table(),
                timeout_seconds: 1,
            },
            client: ClientConfig {
                relay_url: "http://127.0.0.1:1/".into(),
                transcript_file: work_dir.join(default_transcript_file()),
                log_file: work_dir.join(default_client_log_file()),
                request_timeout_seconds: 2,
                probe_interval_seconds: 0,
                probe_timeout_seconds: 1,
            },
            search_api_key: None,
            llm_api_key: None,
            log_store_key: None,
            log_store_enabled: false,
        }
    }
}
