//! Outbound messaging gateway seam.

use async_trait::async_trait;

/// Why a send did not go through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// Gateway answered with a non-success status; holds the response body.
    #[error("gateway rejected message: {0}")]
    Rejected(String),
    /// The request never got a response (connect error, TLS, missing credentials, ...).
    #[error("gateway transport error: {0}")]
    Transport(String),
}

/// Sends a text message to a WhatsApp recipient.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Gateway id (e.g. "whapi").
    fn id(&self) -> &str;

    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError>;
}
