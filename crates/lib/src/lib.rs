//! zap-relay core library: config, LLM responder, WhatsApp gateway clients, webhook adapter
//! and the HTTP server used by the CLI.

pub mod api;
pub mod channels;
pub mod config;
pub mod llm;
pub mod responder;
pub mod webhook;
