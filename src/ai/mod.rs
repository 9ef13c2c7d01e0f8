//! Model gateway: the single integration point with the Gemini API.
//!
//! `client` speaks the wire protocol; `gateway` formats payloads, derives
//! cache keys, and deduplicates outbound calls through an in-memory
//! response cache.

mod client;
mod gateway;

pub use client::GeminiClient;
pub use gateway::{Completion, Gateway, PromptContext};

#[cfg(test)]
pub(crate) use gateway::StubClient;
