//! Symptom relay — web search + LLM answer pipeline behind one HTTP
//! endpoint, plus the chat client that talks to it.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod llm;
pub mod logger;
pub mod logstore;
pub mod relay;
pub mod search;
