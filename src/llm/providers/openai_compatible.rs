//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! All OpenAI wire types are private to this module — callers only see
//! [`InferenceRequest`] in and a `String` out. The provider is stateless.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{InferenceRequest, ProviderError};

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Covers OpenAI, OpenAI-compatible local servers (Ollama, LM Studio…),
/// and hosted alternatives. Constructed once at startup, then cheaply cloned
/// because `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, temperature, max_tokens, api_key })
    }

    /// One round-trip: `system` then `user`, bounded by `max_tokens`.
    pub async fn complete(&self, request: &InferenceRequest) -> Result<String, ProviderError> {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if self.model.starts_with("gpt-5") {
            None
        } else {
            Some(self.temperature)
        };

        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message { role: "system".to_string(), content: request.system_instruction.clone() },
                Message { role: "user".to_string(), content: request.user_content.clone() },
            ],
            temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            max_tokens = payload.max_tokens,
            content_len = request.user_content.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, timeout = e.is_timeout(), "LLM HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProviderError::Request("empty or missing content in response".into()))
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env
            .error
            .code
            .map(|v| match v {
                serde_json::Value::String(s) => format!(" [code={s}]"),
                other => format!(" [code={other}]"),
            })
            .unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/v1/chat/completions")
    }

    fn provider(url: String, model: &str) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(url, model.into(), 0.2, 512, 2, Some("sk-test".into())).unwrap()
    }

    fn request() -> InferenceRequest {
        InferenceRequest { system_instruction: "be helpful".into(), user_content: "hi".into() }
    }

    #[tokio::test]
    async fn sends_system_then_user_with_max_tokens() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let ok = headers.get("authorization").map(|v| v == "Bearer sk-test").unwrap_or(false)
                    && body["messages"][0]["role"] == "system"
                    && body["messages"][0]["content"] == "be helpful"
                    && body["messages"][1]["role"] == "user"
                    && body["messages"][1]["content"] == "hi"
                    && body["max_tokens"] == 512;
                let text = if ok { "  answer  " } else { "bad request shape" };
                Json(json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] }))
            }),
        );
        let p = provider(serve(router).await, "test-model");
        assert_eq!(p.complete(&request()).await.unwrap(), "  answer  ");
    }

    #[tokio::test]
    async fn gpt5_models_omit_temperature() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                let text = if body.get("temperature").is_none() { "omitted" } else { "present" };
                Json(json!({ "choices": [{ "message": { "content": text } }] }))
            }),
        );
        let p = provider(serve(router).await, "gpt-5-mini");
        assert_eq!(p.complete(&request()).await.unwrap(), "omitted");
    }

    #[tokio::test]
    async fn whitespace_only_content_is_an_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [{ "message": { "content": " \n " } }] })) }),
        );
        let p = provider(serve(router).await, "m");
        assert!(p.complete(&request()).await.is_err());
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let router = Router::new().route("/v1/chat/completions", post(|| async { Json(json!({ "choices": [] })) }));
        let p = provider(serve(router).await, "m");
        assert!(p.complete(&request()).await.is_err());
    }

    #[tokio::test]
    async fn error_envelope_message_is_surfaced() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": { "message": "rate limited", "code": "rate_limit" } })),
                )
            }),
        );
        let p = provider(serve(router).await, "m");
        let err = p.complete(&request()).await.unwrap_err().to_string();
        assert!(err.contains("rate limited"));
        assert!(err.contains("rate_limit"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails() {
        let p = provider("http://127.0.0.1:1/v1/chat/completions".into(), "m");
        assert!(p.complete(&request()).await.is_err());
    }
}
