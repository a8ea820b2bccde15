//! HTTP request/response bodies.

use serde::{Deserialize, Serialize};

/// `POST /perguntar` request: `{ "mensagem": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerguntaRequest {
    pub mensagem: String,
}

/// `POST /perguntar` response: `{ "resposta": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespostaResponse {
    pub resposta: String,
}

/// Request-level failure: `{ "error": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
