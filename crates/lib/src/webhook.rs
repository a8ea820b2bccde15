//! Webhook adapter: envelope in, reply sent, status document out.
//!
//! Order of checks follows the envelope parser (event type, messages, echo, fields),
//! then one responder call and one gateway send. Every outcome is a status body; nothing here
//! fails at the transport level.

use crate::channels::{parse_inbound_message, Envelope, MessageGateway, SendError};
use crate::config::Provider;
use crate::responder::Responder;
use serde::Serialize;
use serde_json::Value;

pub const STATUS_OK: &str = "ok";
pub const STATUS_SEND_FAILED: &str = "erro_envio";
pub const STATUS_HTTP_FAILED: &str = "erro_http";
pub const STATUS_LLM_FAILED: &str = "erro_llm";

/// Body returned by `POST /webhook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalhe: Option<String>,
}

impl WebhookStatus {
    fn plain(status: &'static str) -> Self {
        Self {
            status,
            detalhe: None,
        }
    }

    fn with_detail(status: &'static str, detail: String) -> Self {
        Self {
            status,
            detalhe: Some(detail),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

impl From<SendError> for WebhookStatus {
    fn from(e: SendError) -> Self {
        match e {
            SendError::Rejected(body) => Self::with_detail(STATUS_SEND_FAILED, body),
            SendError::Transport(msg) => Self::with_detail(STATUS_HTTP_FAILED, msg),
        }
    }
}

/// Process one webhook body: parse, answer through the responder, send through the gateway.
pub async fn handle_envelope(
    provider: Provider,
    body: &Value,
    responder: &dyn Responder,
    gateway: &dyn MessageGateway,
) -> WebhookStatus {
    let msg = match parse_inbound_message(provider, body) {
        Envelope::Message(m) => m,
        Envelope::Skip(reason) => {
            log::debug!("webhook: skipped ({})", reason.status());
            return WebhookStatus::plain(reason.status());
        }
    };
    log::info!("webhook: message from {}", msg.sender);

    let reply = match responder.respond(&msg.text).await {
        Ok(r) => r,
        Err(e) => {
            log::warn!("webhook: responder failed for {}: {}", msg.sender, e);
            return WebhookStatus::with_detail(STATUS_LLM_FAILED, e.to_string());
        }
    };

    match gateway.send_text(&msg.sender, &reply).await {
        Ok(()) => {
            log::info!("webhook: reply sent to {} via {}", msg.sender, gateway.id());
            WebhookStatus::plain(STATUS_OK)
        }
        Err(e) => {
            log::warn!("webhook: sending reply to {} failed: {}", msg.sender, e);
            e.into()
        }
    }
}
