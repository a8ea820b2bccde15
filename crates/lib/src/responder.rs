//! Responder: one inbound text in, one generated reply out.
//!
//! A single chat completion per call: optional system prompt plus the user's text.
//! No history across calls, no retries.

use crate::config::{self, Config};
use crate::llm::{ChatMessage, OpenAiClient};
use async_trait::async_trait;

/// One exchange: what the sender wrote and what we answered. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub inbound_text: String,
    pub outbound_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponderError {
    /// The model provider failed (transport error or non-success response).
    #[error("upstream model error: {0}")]
    Upstream(String),
}

/// Produces a reply for a piece of text.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, input: &str) -> Result<String, ResponderError>;

    /// Run `respond` and pair the input with the reply.
    async fn turn(&self, input: &str) -> Result<ConversationTurn, ResponderError> {
        let outbound_text = self.respond(input).await?;
        Ok(ConversationTurn {
            inbound_text: input.to_string(),
            outbound_text,
        })
    }
}

/// Responder backed by an OpenAI-compatible chat completion endpoint.
#[derive(Clone)]
pub struct LlmResponder {
    client: OpenAiClient,
    model: String,
    temperature: f32,
    system_prompt: Option<String>,
}

impl LlmResponder {
    pub fn new(
        client: OpenAiClient,
        model: impl Into<String>,
        temperature: f32,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            system_prompt,
        }
    }

    /// Build from config: base URL, model, temperature, system prompt and the resolved API key.
    pub fn from_config(config: &Config) -> Self {
        let api_key = config::resolve_llm_api_key(config);
        if api_key.is_none() {
            log::warn!("no model API key configured (set OPENAI_API_KEY or llm.apiKey)");
        }
        let client = OpenAiClient::new(Some(config.llm.base_url.clone()), api_key);
        Self::new(
            client,
            config.llm.model.clone(),
            config.llm.temperature,
            config.llm.system_prompt.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages(&self, input: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref prompt) = self.system_prompt {
            if !prompt.trim().is_empty() {
                messages.push(ChatMessage::system(prompt.clone()));
            }
        }
        messages.push(ChatMessage::user(input));
        messages
    }
}

#[async_trait]
impl Responder for LlmResponder {
    async fn respond(&self, input: &str) -> Result<String, ResponderError> {
        log::debug!("responder: calling model {}", self.model);
        let res = self
            .client
            .chat(&self.model, self.messages(input), self.temperature)
            .await
            .map_err(|e| ResponderError::Upstream(e.to_string()))?;
        Ok(res.content().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Responder for Echo {
        async fn respond(&self, input: &str) -> Result<String, ResponderError> {
            Ok(input.to_uppercase())
        }
    }

    #[tokio::test]
    async fn turn_pairs_input_with_reply() {
        let turn = Echo.turn("oi").await.unwrap();
        assert_eq!(
            turn,
            ConversationTurn {
                inbound_text: "oi".to_string(),
                outbound_text: "OI".to_string(),
            }
        );
    }

    #[test]
    fn system_prompt_is_prepended_when_set() {
        let client = OpenAiClient::new(None, None);
        let r = LlmResponder::new(client.clone(), "m", 0.0, Some("be brief".to_string()));
        assert_eq!(
            r.messages("2+2"),
            vec![ChatMessage::system("be brief"), ChatMessage::user("2+2")]
        );
        let r = LlmResponder::new(client, "m", 0.0, Some("   ".to_string()));
        assert_eq!(r.messages("2+2"), vec![ChatMessage::user("2+2")]);
    }

    #[tokio::test]
    async fn unreachable_provider_is_upstream_error() {
        // Port 9 (discard) on loopback is not expected to serve HTTP.
        let client = OpenAiClient::new(Some("http://127.0.0.1:9/v1".to_string()), None);
        let r = LlmResponder::new(client, "m", 0.0, None);
        let err = r.respond("hello").await.unwrap_err();
        assert!(matches!(err, ResponderError::Upstream(_)));
    }
}
