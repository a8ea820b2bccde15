//! HTTP server: health, direct question endpoint, and the WhatsApp webhook.

use crate::api::protocol::{ErrorBody, PerguntaRequest, RespostaResponse};
use crate::channels::{gateway_for, MessageGateway};
use crate::config::Config;
use crate::responder::{LlmResponder, Responder};
use crate::webhook::{self, WebhookStatus};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub responder: Arc<dyn Responder>,
    pub gateway: Arc<dyn MessageGateway>,
}

impl AppState {
    pub fn new(
        config: Config,
        responder: Arc<dyn Responder>,
        gateway: Arc<dyn MessageGateway>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            responder,
            gateway,
        }
    }

    /// State with the LLM responder and the gateway selected by config.
    pub fn from_config(config: Config) -> Self {
        let responder: Arc<dyn Responder> = Arc::new(LlmResponder::from_config(&config));
        let gateway = gateway_for(&config);
        Self::new(config, responder, gateway)
    }
}

/// Routes for the relay. Each request runs on its own task; handlers share no mutable state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/perguntar", post(perguntar))
        .route("/webhook", post(whatsapp_webhook))
        .with_state(state)
}

/// Bind to `server.bind:server.port` and serve until SIGINT/SIGTERM.
pub async fn run_server(config: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    log::info!(
        "provider {}, model {}",
        config.whatsapp.provider.name(),
        config.llm.model
    );
    let state = AppState::from_config(config);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("server listening on {}", bind_addr);
    serve(listener, state).await
}

/// Serve on an already bound listener until SIGINT/SIGTERM.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited")?;
    log::info!("server stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.server.port,
        "provider": state.config.whatsapp.provider.name(),
    }))
}

/// POST /perguntar: ask the responder directly, bypassing the webhook path.
async fn perguntar(
    State(state): State<AppState>,
    Json(req): Json<PerguntaRequest>,
) -> Response {
    match state.responder.respond(&req.mensagem).await {
        Ok(resposta) => Json(RespostaResponse { resposta }).into_response(),
        Err(e) => {
            log::warn!("perguntar: {}", e);
            (StatusCode::BAD_GATEWAY, Json(ErrorBody::new(e.to_string()))).into_response()
        }
    }
}

/// POST /webhook: provider envelope in, status document out. Only unparseable JSON is a non-200.
async fn whatsapp_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let envelope: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("webhook: unparseable body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(format!("invalid json: {}", e))),
            )
                .into_response();
        }
    };
    let status: WebhookStatus = webhook::handle_envelope(
        state.config.whatsapp.provider,
        &envelope,
        state.responder.as_ref(),
        state.gateway.as_ref(),
    )
    .await;
    Json(status).into_response()
}
