//! End-to-end tests for the relay HTTP contract.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; search
//! and inference providers are either in-process (static/dummy) or small
//! axum fakes bound on 127.0.0.1:0.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use serde_json::{Value, json};
use tower::ServiceExt;

use symptom_relay::http::{HttpState, build_router};
use symptom_relay::llm::LlmProvider;
use symptom_relay::llm::providers::dummy::DummyProvider;
use symptom_relay::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use symptom_relay::logstore::LogStore;
use symptom_relay::logstore::memory::MemoryLogStore;
use symptom_relay::logstore::rest::RestLogStore;
use symptom_relay::relay::Relay;
use symptom_relay::relay::prompt::PromptTemplates;
use symptom_relay::search::SearchProvider;
use symptom_relay::search::providers::fixed::StaticProvider;
use symptom_relay::search::providers::serper::SerperProvider;

// =============================================================================
// Helpers
// =============================================================================

const THREE_SECTIONS: &str = "## Possible Conditions\nA common cold or tension headache.\n\n\
## Home Care Recommendations\nRest and fluids.\n\n\
## When to Seek Medical Attention\nHigh fever or stiff neck.\n\n\
*Not medical advice.*";

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    addr
}

/// Fake chat-completions endpoint that records the user content it receives.
#[derive(Clone, Default)]
struct FakeLlm {
    calls: Arc<AtomicUsize>,
    last_user: Arc<Mutex<Option<String>>>,
}

impl FakeLlm {
    async fn provider(&self, delay: Duration) -> LlmProvider {
        let me = self.clone();
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move |axum::Json(body): axum::Json<Value>| {
                let me = me.clone();
                async move {
                    me.calls.fetch_add(1, Ordering::SeqCst);
                    *me.last_user.lock().unwrap() =
                        body["messages"][1]["content"].as_str().map(str::to_string);
                    tokio::time::sleep(delay).await;
                    axum::Json(json!({ "choices": [{ "message": { "content": THREE_SECTIONS } }] }))
                }
            }),
        );
        let addr = spawn(router).await;
        LlmProvider::OpenAiCompatible(
            OpenAiCompatibleProvider::new(
                format!("http://{addr}/v1/chat/completions"),
                "test-model".into(),
                0.0,
                256,
                10,
                None,
            )
            .unwrap(),
        )
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_user(&self) -> Option<String> {
        self.last_user.lock().unwrap().clone()
    }
}

/// Fake search endpoint that counts calls and returns the given organic list.
async fn counting_search(organic: Value) -> (SearchProvider, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let router = Router::new().route(
        "/search",
        post(move || {
            let counter = Arc::clone(&counter);
            let organic = organic.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                axum::Json(json!({ "organic": organic }))
            }
        }),
    );
    let addr = spawn(router).await;
    let provider = SearchProvider::Serper(
        SerperProvider::new(format!("http://{addr}/search"), Some("key".into()), 5, 5).unwrap(),
    );
    (provider, calls)
}

fn static_two() -> SearchProvider {
    SearchProvider::Static(StaticProvider::new(
        vec![
            ("Tension headache".into(), "Tension headaches cause mild, aching pain.".into()),
            ("Sore throat".into(), "Most sore throats are caused by viral infections.".into()),
        ],
        5,
    ))
}

fn failing_llm() -> LlmProvider {
    LlmProvider::OpenAiCompatible(
        OpenAiCompatibleProvider::new("http://127.0.0.1:1/v1/chat/completions".into(), "m".into(), 0.0, 64, 1, None)
            .unwrap(),
    )
}

fn app(relay: Relay, timeout: Duration) -> Router {
    build_router(HttpState::new(Arc::new(relay), timeout), "/")
}

fn relay(search: SearchProvider, llm: LlmProvider) -> Relay {
    Relay::new(search, llm, PromptTemplates::default(), "Test Assistant")
}

fn post_json(body: &str) -> Request<Body> {
    Request::post("/")
        .header("content-type", "application/json")
        .header("origin", "https://chat.example")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

// =============================================================================
// Liveness and CORS
// =============================================================================

#[tokio::test]
async fn get_is_liveness() {
    let app = app(relay(static_two(), LlmProvider::Dummy(DummyProvider)), Duration::from_secs(5));
    let resp = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn preflight_is_permissive_and_empty() {
    let app = app(relay(static_two(), LlmProvider::Dummy(DummyProvider)), Duration::from_secs(5));
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/")
        .header("origin", "https://anywhere.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.status().is_success());

    let headers = resp.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    let methods = headers.get("access-control-allow-methods").unwrap().to_str().unwrap().to_string();
    for m in ["GET", "POST", "OPTIONS"] {
        assert!(methods.contains(m), "missing {m} in {methods}");
    }
    let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn post_response_carries_cors_header() {
    let app = app(relay(static_two(), LlmProvider::Dummy(DummyProvider)), Duration::from_secs(5));
    let resp = app.oneshot(post_json(r#"{"message":"cough"}"#)).await.unwrap();
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
}

// =============================================================================
// Answer scenarios
// =============================================================================

#[tokio::test]
async fn headache_scenario_embeds_numbered_snippets_and_returns_sections() {
    let llm = FakeLlm::default();
    let app = app(relay(static_two(), llm.provider(Duration::ZERO).await), Duration::from_secs(10));

    let (status, body) =
        send(app, post_json(r#"{"message":"I have a mild headache and sore throat"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let reply = body["reply"].as_str().unwrap();
    assert!(!reply.is_empty());
    assert!(reply.contains("Possible Conditions"));
    assert!(reply.contains("Home Care"));
    assert!(reply.contains("Seek Medical Attention"));
    assert!(body.get("error").is_none());

    let user = llm.last_user().unwrap();
    assert!(user.contains("1. Tension headache: Tension headaches cause mild, aching pain."));
    assert!(user.contains("2. Sore throat: Most sore throats are caused by viral infections."));
    assert!(user.contains("I have a mild headache and sore throat"));
}

#[tokio::test]
async fn empty_message_rejected_before_any_provider_call() {
    let (search, search_calls) = counting_search(json!([{ "title": "t", "snippet": "s" }])).await;
    let llm = FakeLlm::default();
    let app = app(relay(search, llm.provider(Duration::ZERO).await), Duration::from_secs(5));

    let (status, body) = send(app, post_json(r#"{"message":""}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "message required");
    assert!(body.get("reply").is_none());
    assert_eq!(search_calls.load(Ordering::SeqCst), 0);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn missing_message_field_is_message_required() {
    let app = app(relay(static_two(), LlmProvider::Dummy(DummyProvider)), Duration::from_secs(5));
    let (status, body) = send(app, post_json("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "message required");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app(relay(static_two(), LlmProvider::Dummy(DummyProvider)), Duration::from_secs(5));
    let (status, body) = send(app, post_json("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));
}

#[tokio::test]
async fn zero_search_results_still_succeeds() {
    let (search, search_calls) = counting_search(json!([])).await;
    let llm = FakeLlm::default();
    let app = app(relay(search, llm.provider(Duration::ZERO).await), Duration::from_secs(10));

    let (status, body) = send(app, post_json(r#"{"message":"itchy eyes"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["reply"].as_str().unwrap().is_empty());
    assert_eq!(search_calls.load(Ordering::SeqCst), 1);
    assert!(llm.last_user().unwrap().contains("No web results found"));
}

#[tokio::test]
async fn missing_search_credential_is_configuration_failure() {
    let search = SearchProvider::Serper(
        SerperProvider::new("http://127.0.0.1:1/search".into(), None, 5, 1).unwrap(),
    );
    let llm = FakeLlm::default();
    let app = app(relay(search, llm.provider(Duration::ZERO).await), Duration::from_secs(5));

    let (status, body) = send(app, post_json(r#"{"message":"cough"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("configuration error"));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn inference_failure_is_failure_not_empty_reply() {
    let app = app(relay(static_two(), failing_llm()), Duration::from_secs(5));

    let (status, body) = send(app, post_json(r#"{"message":"rash on arm"}"#)).await;

    assert!(!status.is_success());
    assert!(body.get("reply").is_none());
    assert!(body["error"].as_str().unwrap().starts_with("failed to generate response"));
}

#[tokio::test]
async fn slow_inference_hits_request_timeout() {
    let llm = FakeLlm::default();
    let app = app(relay(static_two(), llm.provider(Duration::from_secs(3)).await), Duration::from_millis(300));

    let (status, body) = send(app, post_json(r#"{"message":"chest pain"}"#)).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "request timed out");
}

// =============================================================================
// Logging is best-effort
// =============================================================================

#[tokio::test]
async fn log_store_outcome_never_changes_the_response() {
    let llm = FakeLlm::default();
    let provider = llm.provider(Duration::ZERO).await;

    let memory = MemoryLogStore::new();
    let ok_relay = Arc::new(
        relay(static_two(), provider.clone()).with_log_store(Some(LogStore::Memory(memory.clone()))),
    );
    let broken = RestLogStore::new("http://127.0.0.1:1/rest/v1".into(), "chat_logs", "k".into(), 1).unwrap();
    let bad_relay = Arc::new(relay(static_two(), provider).with_log_store(Some(LogStore::Rest(broken))));

    let ok_app = build_router(HttpState::new(Arc::clone(&ok_relay), Duration::from_secs(10)), "/");
    let bad_app = build_router(HttpState::new(Arc::clone(&bad_relay), Duration::from_secs(10)), "/");

    let (ok_status, ok_body) = send(ok_app, post_json(r#"{"message":"sneezing"}"#)).await;
    let (bad_status, bad_body) = send(bad_app, post_json(r#"{"message":"sneezing"}"#)).await;

    assert_eq!(ok_status, StatusCode::OK);
    assert_eq!(ok_status, bad_status);
    assert_eq!(ok_body, bad_body);

    ok_relay.flush_logs().await;
    bad_relay.flush_logs().await;

    let records = memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].query, "sneezing");
    assert_eq!(records[0].response, ok_body["reply"].as_str().unwrap());
    assert!(records[0].context.starts_with("1. Tension headache"));
}
