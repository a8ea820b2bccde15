//! WhatsApp gateway clients: send a text reply through the configured provider's REST API.

use crate::channels::gateway::{MessageGateway, SendError};
use crate::config::{self, Config, Provider};
use async_trait::async_trait;
use std::sync::Arc;

/// Whapi-style gateway: `POST {base}/messages/text` with bearer token and `{to, body}`.
pub struct WhapiGateway {
    api_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl WhapiGateway {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessageGateway for WhapiGateway {
    fn id(&self) -> &str {
        "whapi"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| SendError::Transport("whatsapp gateway token not configured".to_string()))?;
        let url = format!("{}/messages/text", self.api_url);
        let payload = serde_json::json!({ "to": to, "body": body });
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;
        check_response(res).await
    }
}

/// Z-API-style gateway: instance id and token in the URL path, `{phone, message}` body.
pub struct ZapiGateway {
    api_url: String,
    instance_id: Option<String>,
    token: Option<String>,
    client: reqwest::Client,
}

impl ZapiGateway {
    pub fn new(api_url: impl Into<String>, instance_id: Option<String>, token: Option<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            instance_id,
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessageGateway for ZapiGateway {
    fn id(&self) -> &str {
        "zapi"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError> {
        let (Some(instance), Some(token)) = (self.instance_id.as_ref(), self.token.as_ref()) else {
            return Err(SendError::Transport(
                "z-api instance id or token not configured".to_string(),
            ));
        };
        let url = format!(
            "{}/instances/{}/token/{}/send-messages",
            self.api_url, instance, token
        );
        let payload = serde_json::json!({ "phone": to, "message": body });
        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;
        check_response(res).await
    }
}

/// Non-success status becomes `Rejected` with the raw response body.
async fn check_response(res: reqwest::Response) -> Result<(), SendError> {
    if res.status().is_success() {
        return Ok(());
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    log::debug!("gateway answered {}: {}", status, body);
    Err(SendError::Rejected(body))
}

/// Build the gateway selected by `whatsapp.provider`.
pub fn gateway_for(config: &Config) -> Arc<dyn MessageGateway> {
    let api_url = config::resolve_gateway_url(config);
    let token = config::resolve_gateway_token(config);
    if token.is_none() {
        log::warn!("no messaging gateway token configured (set WHAPI_TOKEN or whatsapp.token)");
    }
    match config.whatsapp.provider {
        Provider::Whapi => Arc::new(WhapiGateway::new(api_url, token)),
        Provider::Zapi => Arc::new(ZapiGateway::new(
            api_url,
            config.whatsapp.instance_id.clone(),
            token,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn record(
        State(c): State<Captured>,
        uri: axum::http::Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let failing = body.get("body").and_then(Value::as_str) == Some("fail");
        c.requests.lock().await.push((uri.path().to_string(), auth, body));
        if failing {
            (StatusCode::INTERNAL_SERVER_ERROR, "bad token".to_string())
        } else {
            (StatusCode::OK, r#"{"sent":true}"#.to_string())
        }
    }

    async fn stub_gateway() -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route("/*path", post(record))
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{}", addr), captured)
    }

    #[tokio::test]
    async fn whapi_posts_bearer_authenticated_json() {
        let (url, captured) = stub_gateway().await;
        let gw = WhapiGateway::new(format!("{}/", url), Some("secret".to_string()));
        gw.send_text("5511999999999", "Oi").await.unwrap();
        let reqs = captured.requests.lock().await;
        assert_eq!(reqs.len(), 1);
        let (path, auth, body) = &reqs[0];
        assert_eq!(path, "/messages/text");
        assert_eq!(auth.as_deref(), Some("Bearer secret"));
        assert_eq!(body, &serde_json::json!({ "to": "5511999999999", "body": "Oi" }));
    }

    #[tokio::test]
    async fn whapi_non_success_is_rejected_with_body() {
        let (url, _captured) = stub_gateway().await;
        let gw = WhapiGateway::new(url, Some("secret".to_string()));
        let err = gw.send_text("1", "fail").await.unwrap_err();
        assert_eq!(err, SendError::Rejected("bad token".to_string()));
    }

    #[tokio::test]
    async fn whapi_without_token_makes_no_call() {
        let (url, captured) = stub_gateway().await;
        let gw = WhapiGateway::new(url, None);
        let err = gw.send_text("1", "x").await.unwrap_err();
        assert!(matches!(err, SendError::Transport(_)));
        assert!(captured.requests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_gateway_is_transport_error() {
        let gw = WhapiGateway::new("http://127.0.0.1:9", Some("t".to_string()));
        let err = gw.send_text("1", "x").await.unwrap_err();
        assert!(matches!(err, SendError::Transport(_)));
    }

    #[tokio::test]
    async fn zapi_puts_credentials_in_path() {
        let (url, captured) = stub_gateway().await;
        let gw = ZapiGateway::new(url, Some("inst".to_string()), Some("tok".to_string()));
        gw.send_text("5511999999999", "Oi").await.unwrap();
        let reqs = captured.requests.lock().await;
        let (path, auth, body) = &reqs[0];
        assert_eq!(path, "/instances/inst/token/tok/send-messages");
        assert!(auth.is_none());
        assert_eq!(
            body,
            &serde_json::json!({ "phone": "5511999999999", "message": "Oi" })
        );
    }

    #[test]
    fn gateway_for_follows_provider() {
        let mut config = Config::default();
        assert_eq!(gateway_for(&config).id(), "whapi");
        config.whatsapp.provider = Provider::Zapi;
        assert_eq!(gateway_for(&config).id(), "zapi");
    }
}
