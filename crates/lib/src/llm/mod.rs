//! LLM client.
//!
//! One OpenAI-compatible chat completion call per request; no streaming, no tools.

mod openai;

pub use openai::{ChatMessage, ChatResponse, LlmError, OpenAiClient};
