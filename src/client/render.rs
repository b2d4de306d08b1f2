//! Plain-terminal rendering of transcript bubbles.
//!
//! Assistant markdown is printed as-is; terminals show it readably enough
//! and the relay's section headers stay recognisable.

use super::message::{Message, Role};
use super::relay_client::ConnectionStatus;

pub fn bubble(message: &Message) -> String {
    let marker = if message.is_error() { " [!]" } else { "" };
    let gutter = match message.role() {
        Role::User => "  │ ",
        Role::Assistant => "│ ",
    };
    let header = match message.role() {
        Role::User => format!("  ┌ {}{marker}", message.role().label()),
        Role::Assistant => format!("┌ {}{marker}", message.role().label()),
    };
    let body = message
        .content()
        .lines()
        .map(|l| format!("{gutter}{l}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{header}\n{body}\n{}└", if matches!(message.role(), Role::User) { "  " } else { "" })
}

pub fn transcript(messages: &[Message]) -> String {
    messages.iter().map(bubble).collect::<Vec<_>>().join("\n\n")
}

pub fn status_line(status: ConnectionStatus, loading: bool) -> String {
    if loading {
        format!("[relay: {} · waiting for answer…]", status.label())
    } else {
        format!("[relay: {}]", status.label())
    }
}
