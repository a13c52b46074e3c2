//! OpenAI Chat Completions client.
//!
//! Implements the `AiClient` trait against any OpenAI-compatible
//! `/chat/completions` endpoint with `stream: true`, yielding the
//! `choices[0].delta.content` pieces as fragments.

mod api;
mod client;
mod config;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
