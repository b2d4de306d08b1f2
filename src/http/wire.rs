//! JSON bodies exchanged between the chat client and the relay.
//! Both sides use these types, so the contract lives in one place.

use serde::{Deserialize, Serialize};

/// `POST` body. `message` is optional on the wire so a missing field is
/// reported as "message required" rather than a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnswerRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()) }
    }
}

/// Success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub reply: String,
}

/// Failure body, paired with a non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
