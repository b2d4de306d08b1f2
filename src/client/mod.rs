//! Chat client: transcript state, persistence, relay calls, probing.
//!
//! Front-ends (the `symptom-chat` terminal binary, or any other UI) own one
//! [`ChatSession`] and drive it; the session is the only holder of transcript
//! and loading/connection state.

pub mod message;
pub mod probe;
pub mod relay_client;
pub mod render;
pub mod session;
pub mod store;

pub use message::{Message, Role};
pub use relay_client::{ClientError, ConnectionStatus, RelayApi, RelayClient};
pub use session::{ChatSession, PendingTurn};
pub use store::{FileTranscriptStore, MemoryTranscriptStore, TranscriptStore};
