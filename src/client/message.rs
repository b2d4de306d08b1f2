//! Transcript entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shown as the first entry of a brand-new transcript.
pub const WELCOME_TEXT: &str = "Hello! I'm your symptom assistant. Describe how you're feeling \
and I'll share possible causes, home-care tips and warning signs to watch for. \
I'm not a doctor, so please consult a healthcare professional for medical advice.";

/// Replaces the transcript on reset.
pub const NEW_SESSION_TEXT: &str =
    "New conversation started. What symptoms would you like to talk about?";

/// The only text a failed relay call ever puts into the transcript.
pub const APOLOGY_TEXT: &str =
    "Sorry, I couldn't get an answer right now. Please check your connection and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

/// One chat bubble. Immutable once created; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: String,
    role: Role,
    content: String,
    #[serde(default)]
    error_flag: bool,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, error_flag: bool) -> Self {
        Self { id: Uuid::new_v4().to_string(), role, content: content.into(), error_flag }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, false)
    }

    /// Markdown reply from the relay.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, false)
    }

    pub fn apology() -> Self {
        Self::new(Role::Assistant, APOLOGY_TEXT, true)
    }

    pub fn welcome() -> Self {
        Self::assistant(WELCOME_TEXT)
    }

    pub fn new_session() -> Self {
        Self::assistant(NEW_SESSION_TEXT)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_error(&self) -> bool {
        self.error_flag
    }
}
