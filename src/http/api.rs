//! Axum handlers for the relay route.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use super::HttpState;
use super::wire::{AnswerRequest, AnswerResponse, ErrorResponse};
use crate::relay::RelayError;

fn failure(status: StatusCode, error: impl std::fmt::Display) -> Response {
    (status, Json(ErrorResponse { error: error.to_string() })).into_response()
}

fn status_for(err: &RelayError) -> StatusCode {
    match err {
        RelayError::MessageRequired => StatusCode::BAD_REQUEST,
        RelayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RelayError::Inference(_) => StatusCode::BAD_GATEWAY,
    }
}

/// GET — liveness.
pub(super) async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// OPTIONS without CORS request headers. Real preflights are answered by
/// the CORS layer before reaching here.
pub(super) async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// POST — run the answer pipeline.
pub(super) async fn answer(
    State(state): State<HttpState>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Response {
    let message = match payload {
        Ok(Json(req)) => req.message.unwrap_or_default(),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected request body");
            return failure(
                StatusCode::BAD_REQUEST,
                format!("invalid request body: {}", rejection.body_text()),
            );
        }
    };

    info!(query_len = message.len(), "answer requested");

    match tokio::time::timeout(state.request_timeout, state.relay.answer(&message)).await {
        Ok(Ok(reply)) => (StatusCode::OK, Json(AnswerResponse { reply })).into_response(),
        Ok(Err(e)) => {
            let status = status_for(&e);
            warn!(%status, error = %e, "answer failed");
            failure(status, e)
        }
        Err(_) => {
            warn!(timeout = ?state.request_timeout, "answer timed out");
            failure(StatusCode::GATEWAY_TIMEOUT, "request timed out")
        }
    }
}
