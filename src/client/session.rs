//! Per-session chat state: transcript, loading flag, connection status.
//!
//! The session owns all mutable UI state and is passed to whatever renders
//! it; nothing here is process-global. Every transcript mutation is
//! followed by a persist, whose failure is logged and otherwise ignored.
//!
//! ```text
//!   idle ──begin_submit──▶ loading ──complete(Ok|Err)──▶ idle
//!     ▲                      │ begin_submit → None
//!     └──────── reset ───────┘ (transcript only)
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use super::message::{Message, Role};
use super::relay_client::{ClientError, ConnectionStatus, RelayApi};
use super::store::TranscriptStore;

/// Proof that a submission was accepted. Only [`ChatSession::begin_submit`]
/// creates one, so at most one exists while the session is loading.
#[derive(Debug)]
#[must_use = "pass the turn back to ChatSession::complete"]
pub struct PendingTurn {
    text: String,
    generation: u64,
}

impl PendingTurn {
    pub fn text(&self) -> &str {
        &self.text
    }
}

pub struct ChatSession<S: TranscriptStore> {
    transcript: Vec<Message>,
    loading: bool,
    connection: ConnectionStatus,
    /// Bumped on reset; turns begun under an older value are stale.
    generation: u64,
    store: S,
}

impl<S: TranscriptStore> ChatSession<S> {
    /// Restore the stored transcript, or start with a welcome message when
    /// nothing usable is stored.
    pub fn initialize(store: S) -> Self {
        let transcript = match store.load() {
            Ok(Some(messages)) if is_well_formed(&messages) => messages,
            Ok(Some(messages)) if !messages.is_empty() => {
                warn!(len = messages.len(), "stored transcript breaks ordering or id rules — starting fresh");
                vec![Message::welcome()]
            }
            Ok(_) => {
                debug!("no stored transcript — starting fresh");
                vec![Message::welcome()]
            }
            Err(e) => {
                warn!(error = %e, "stored transcript unusable — starting fresh");
                vec![Message::welcome()]
            }
        };
        let session = Self {
            transcript,
            loading: false,
            connection: ConnectionStatus::Unknown,
            generation: 0,
            store,
        };
        session.persist();
        session
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = status;
    }

    /// Replace the whole transcript with a single new-session greeting.
    ///
    /// A turn still pending keeps the session loading until it completes,
    /// but its answer is discarded: the question it belongs to is gone.
    pub fn reset(&mut self) {
        self.transcript = vec![Message::new_session()];
        self.generation += 1;
        self.persist();
    }

    /// Append the user's turn and enter loading. `None` for blank input or
    /// while a previous turn is still pending.
    pub fn begin_submit(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() || self.loading {
            return None;
        }
        self.loading = true;
        self.push(Message::user(text));
        Some(PendingTurn { text: text.to_string(), generation: self.generation })
    }

    /// Record the relay outcome for `turn` and leave loading, whatever the
    /// outcome. Returns the appended message, or `None` when a reset since
    /// `begin_submit` made the turn stale.
    pub fn complete(
        &mut self,
        turn: PendingTurn,
        outcome: Result<String, ClientError>,
    ) -> Option<&Message> {
        self.loading = false;
        if turn.generation != self.generation {
            debug!(ok = outcome.is_ok(), "dropping outcome of a turn begun before reset");
            return None;
        }
        let message = match outcome {
            Ok(reply) => Message::assistant(reply),
            Err(e) => {
                warn!(error = %e, query_len = turn.text.len(), "relay call failed");
                Message::apology()
            }
        };
        self.push(message);
        self.transcript.last()
    }

    /// `begin_submit`, one relay call, `complete`. Returns the assistant
    /// message, or `None` when the submission was a no-op.
    pub async fn submit<R: RelayApi>(&mut self, text: &str, relay: &R) -> Option<&Message> {
        let turn = self.begin_submit(text)?;
        let outcome = relay.answer(turn.text()).await;
        self.complete(turn, outcome)
    }

    fn push(&mut self, message: Message) {
        self.transcript.push(message);
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.transcript) {
            warn!(error = %e, "failed to persist transcript");
        }
    }
}

/// A stored transcript is usable when it starts with an assistant message
/// and no two messages share an id.
fn is_well_formed(messages: &[Message]) -> bool {
    let Some(first) = messages.first() else {
        return false;
    };
    let mut ids = HashSet::with_capacity(messages.len());
    first.role() == Role::Assistant && messages.iter().all(|m| ids.insert(m.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::message::APOLOGY_TEXT;
    use crate::client::store::MemoryTranscriptStore;

    #[test]
    fn fresh_session_has_welcome() {
        let s = ChatSession::initialize(MemoryTranscriptStore::new());
        assert_eq!(s.transcript().len(), 1);
        assert_eq!(s.transcript()[0].role(), Role::Assistant);
        assert!(!s.is_loading());
        assert_eq!(s.connection(), ConnectionStatus::Unknown);
    }

    #[test]
    fn begin_then_complete_ok() {
        let mut s = ChatSession::initialize(MemoryTranscriptStore::new());
        let turn = s.begin_submit("  cough  ").unwrap();
        assert_eq!(turn.text(), "cough");
        assert!(s.is_loading());
        let reply = s.complete(turn, Ok("**answer**".into())).unwrap();
        assert_eq!(reply.content(), "**answer**");
        assert!(!s.is_loading());
        assert_eq!(s.transcript().len(), 3);
    }

    #[test]
    fn failure_appends_apology_without_details() {
        let mut s = ChatSession::initialize(MemoryTranscriptStore::new());
        let turn = s.begin_submit("cough").unwrap();
        let reply = s.complete(
            turn,
            Err(ClientError::Status { status: 502, message: "upstream secret detail".into() }),
        )
        .unwrap();
        assert!(reply.is_error());
        assert_eq!(reply.content(), APOLOGY_TEXT);
        assert!(!s.is_loading());
    }

    #[test]
    fn second_begin_while_loading_is_rejected() {
        let mut s = ChatSession::initialize(MemoryTranscriptStore::new());
        let first = s.begin_submit("one").unwrap();
        assert!(s.begin_submit("two").is_none());
        assert_eq!(s.transcript().len(), 2);
        let _ = s.complete(first, Ok("done".into()));
        assert!(s.begin_submit("three").is_some());
    }

    #[test]
    fn persistence_failure_is_not_fatal() {
        let mut s = ChatSession::initialize(MemoryTranscriptStore::failing());
        let turn = s.begin_submit("hi").unwrap();
        let _ = s.complete(turn, Ok("hello".into()));
        assert_eq!(s.transcript().len(), 3);
    }

    #[test]
    fn connection_status_is_session_state() {
        let mut s = ChatSession::initialize(MemoryTranscriptStore::new());
        s.set_connection(ConnectionStatus::Disconnected);
        assert_eq!(s.connection(), ConnectionStatus::Disconnected);
        assert!(s.begin_submit("still allowed").is_some());
    }

    #[test]
    fn answer_to_a_turn_begun_before_reset_is_dropped() {
        let store = MemoryTranscriptStore::new();
        let mut s = ChatSession::initialize(store.clone());
        let turn = s.begin_submit("old question").unwrap();
        s.reset();
        assert!(s.is_loading());

        assert!(s.complete(turn, Ok("old answer".into())).is_none());
        assert!(!s.is_loading());
        assert_eq!(s.transcript().len(), 1);
        assert_eq!(s.transcript()[0].content(), crate::client::message::NEW_SESSION_TEXT);
        assert_eq!(store.load().unwrap().unwrap(), s.transcript());

        let next = s.begin_submit("new question").unwrap();
        assert!(s.complete(next, Ok("new answer".into())).is_some());
        assert_eq!(s.transcript().len(), 3);
    }

    #[test]
    fn stored_transcript_must_open_with_assistant_and_unique_ids() {
        let first_user = Message::user("hi");
        assert!(!is_well_formed(&[first_user, Message::assistant("hello")]));

        let welcome = Message::welcome();
        assert!(!is_well_formed(&[welcome.clone(), welcome.clone()]));
        assert!(is_well_formed(&[welcome, Message::user("hi")]));
        assert!(!is_well_formed(&[]));
    }
}
