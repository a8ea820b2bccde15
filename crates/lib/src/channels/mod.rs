//! WhatsApp channel plumbing.
//!
//! Inbound: normalise provider webhook envelopes into sender + text.
//! Outbound: send the reply through the configured messaging gateway.

mod gateway;
mod inbound;
mod whatsapp;

pub use gateway::{MessageGateway, SendError};
pub use inbound::{parse_inbound_message, Envelope, InboundMessage, SkipReason};
pub use whatsapp::{gateway_for, WhapiGateway, ZapiGateway};
