//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.zap-relay/config.json`) and environment.
//! Secrets (gateway token, model API key) are normally supplied through the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Language-model settings used by the responder.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Messaging gateway settings (provider, URL, token).
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// Server bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for HTTP (default 8000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    8000
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// OpenAI-compatible chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// Base URL of the chat-completions API, including the version segment.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    /// API key. Overridden by OPENAI_API_KEY env.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Optional system message sent before the user's text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: 0.0,
            api_key: None,
            system_prompt: None,
        }
    }
}

/// Which WhatsApp gateway the relay talks to. Decides both the inbound envelope shape and the send call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Bearer-token REST gateway; webhook carries `event.event` and a `messages` list.
    #[default]
    Whapi,

    /// Instance/token-in-path gateway; webhook carries flat `phone` and `message`.
    Zapi,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Whapi => "whapi",
            Provider::Zapi => "zapi",
        }
    }

    /// Public API base used when `whatsapp.apiUrl` is not set.
    pub fn default_api_url(&self) -> &'static str {
        match self {
            Provider::Whapi => "https://gate.whapi.cloud",
            Provider::Zapi => "https://api.z-api.io",
        }
    }
}

/// Messaging gateway config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Gateway base URL. Defaults to the provider's public API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Gateway token. Overridden by WHAPI_TOKEN env when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Z-API instance id; unused for whapi.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

/// Read a trimmed, non-empty env var.
fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve the messaging gateway token: env WHAPI_TOKEN overrides config.
pub fn resolve_gateway_token(config: &Config) -> Option<String> {
    env_secret("WHAPI_TOKEN").or_else(|| trimmed(config.whatsapp.token.as_ref()))
}

/// Resolve the model provider API key: env OPENAI_API_KEY overrides config.
pub fn resolve_llm_api_key(config: &Config) -> Option<String> {
    env_secret("OPENAI_API_KEY").or_else(|| trimmed(config.llm.api_key.as_ref()))
}

/// Gateway base URL without trailing slash.
pub fn resolve_gateway_url(config: &Config) -> String {
    trimmed(config.whatsapp.api_url.as_ref())
        .unwrap_or_else(|| config.whatsapp.provider.default_api_url().to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("ZAP_RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".zap-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, the default path, or ZAP_RELAY_CONFIG_PATH. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Write the default config to `path` unless a file already exists there. Returns true when written.
pub fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
    }
    let body = serde_json::to_string_pretty(&Config::default())?;
    std::fs::write(path, body).with_context(|| format!("writing config to {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_port_and_bind() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 8000);
        assert_eq!(s.bind, "127.0.0.1");
    }

    #[test]
    fn empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.whatsapp.provider, Provider::Whapi);
    }

    #[test]
    fn parses_camel_case_fields() {
        let config: Config = serde_json::from_str(
            r#"{
                "server": { "port": 9090 },
                "llm": { "baseUrl": "http://localhost:1234/v1", "systemPrompt": "be brief" },
                "whatsapp": { "provider": "zapi", "instanceId": "abc", "apiUrl": "http://gw/" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.llm.base_url, "http://localhost:1234/v1");
        assert_eq!(config.llm.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(config.whatsapp.provider, Provider::Zapi);
        assert_eq!(config.whatsapp.instance_id.as_deref(), Some("abc"));
        assert_eq!(resolve_gateway_url(&config), "http://gw");
    }

    #[test]
    fn gateway_url_falls_back_to_provider_default() {
        let mut config = Config::default();
        assert_eq!(resolve_gateway_url(&config), "https://gate.whapi.cloud");
        config.whatsapp.provider = Provider::Zapi;
        config.whatsapp.api_url = Some("  ".to_string());
        assert_eq!(resolve_gateway_url(&config), "https://api.z-api.io");
    }

    #[test]
    fn load_config_missing_file_is_default() {
        let path = std::env::temp_dir()
            .join(format!("zap-relay-missing-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn write_default_config_does_not_overwrite() {
        let dir = std::env::temp_dir().join(format!("zap-relay-init-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.json");
        assert!(write_default_config(&path).unwrap());
        assert!(!write_default_config(&path).unwrap());
        let (config, _) = load_config(Some(path)).unwrap();
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        let _ = std::fs::remove_dir_all(dir);
    }
}
