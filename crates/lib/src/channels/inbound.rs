//! Inbound webhook envelopes: normalise a provider's JSON into a sender + text pair.
//!
//! All knowledge of payload shapes lives here. Every field is treated as optional.

use crate::config::Provider;
use serde_json::Value;

/// A text message from a WhatsApp sender, ready for the responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
}

/// Why an envelope produced no message to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Event type is not a posted message.
    NotPost,
    /// Messages list absent or empty.
    NoMessage,
    /// Echo of a message the bot itself sent.
    FromMe,
    /// Sender or text missing.
    Invalid,
}

impl SkipReason {
    /// Status string reported to the webhook caller.
    pub fn status(&self) -> &'static str {
        match self {
            SkipReason::NotPost => "ignored",
            SkipReason::NoMessage => "no message",
            SkipReason::FromMe => "ignored_self_message",
            SkipReason::Invalid => "invalid payload",
        }
    }
}

/// Result of reading one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Message(InboundMessage),
    Skip(SkipReason),
}

/// Extract the message to answer from a raw webhook body, using the provider's payload shape.
pub fn parse_inbound_message(provider: Provider, body: &Value) -> Envelope {
    match provider {
        Provider::Whapi => parse_whapi(body),
        Provider::Zapi => parse_zapi(body),
    }
}

/// `{event: {event: "post"}, messages: [{text: {body}, from, from_me}]}`. Only the first message is read.
fn parse_whapi(body: &Value) -> Envelope {
    let event = body
        .get("event")
        .and_then(|e| e.get("event"))
        .and_then(Value::as_str);
    if event != Some("post") {
        return Envelope::Skip(SkipReason::NotPost);
    }
    let Some(first) = body
        .get("messages")
        .and_then(Value::as_array)
        .and_then(|m| m.first())
    else {
        return Envelope::Skip(SkipReason::NoMessage);
    };
    if first.get("from_me").and_then(Value::as_bool) == Some(true) {
        return Envelope::Skip(SkipReason::FromMe);
    }
    let text = first
        .get("text")
        .and_then(|t| t.get("body"))
        .and_then(Value::as_str);
    let sender = first.get("from").and_then(Value::as_str);
    match (sender, text) {
        (Some(sender), Some(text)) => Envelope::Message(InboundMessage {
            sender: sender.to_string(),
            text: text.to_string(),
        }),
        _ => Envelope::Skip(SkipReason::Invalid),
    }
}

/// `{phone, message, fromMe?}` with no event discriminator.
fn parse_zapi(body: &Value) -> Envelope {
    if body.get("fromMe").and_then(Value::as_bool) == Some(true) {
        return Envelope::Skip(SkipReason::FromMe);
    }
    let text = body.get("message").and_then(Value::as_str);
    let sender = body.get("phone").and_then(Value::as_str);
    match (sender, text) {
        (Some(sender), Some(text)) => Envelope::Message(InboundMessage {
            sender: sender.to_string(),
            text: text.to_string(),
        }),
        _ => Envelope::Skip(SkipReason::Invalid),
    }
}
