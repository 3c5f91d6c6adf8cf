//! LLM API client and types
//!
//! Supports the Anthropic Messages API and OpenAI-compatible chat
//! completions (OpenAI, Gemini, self-hosted gateways).

mod client;
mod types;

pub use client::LlmClient;
pub use types::*;
