//! HTTP surface: `GET /`, `POST /perguntar`, `POST /webhook` on one port.

mod protocol;
mod server;

pub use protocol::{ErrorBody, PerguntaRequest, RespostaResponse};
pub use server::{router, run_server, serve, AppState};
