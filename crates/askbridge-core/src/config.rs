use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Idle minutes after which the next message starts a fresh conversation.
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 60;

/// Top-level config (askbridge.toml + ASKBRIDGE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    pub ask: AskConfig,
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Ask backend credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskConfig {
    pub api_key: String,
    pub agent_id: String,
    #[serde(default = "default_ask_base_url")]
    pub base_url: String,
}

/// WhatsApp Cloud API credentials.
///
/// `verify_token` answers Meta's webhook verification handshake;
/// `app_secret` signs notification bodies (X-Hub-Signature-256).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    pub token: String,
    pub phone_id: String,
    pub verify_token: String,
    pub app_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_timeout_minutes(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_ask_base_url() -> String {
    "https://api.ask.dev.ai71services.ai".to_string()
}
fn default_timeout_minutes() -> i64 {
    DEFAULT_SESSION_TIMEOUT_MINUTES
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.askbridge/askbridge.db", home)
}

impl BridgeConfig {
    /// Load config from a TOML file with ASKBRIDGE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.askbridge/askbridge.toml
    ///
    /// Env overrides use `__` as the section separator, so keys whose names
    /// contain an underscore stay addressable: `ASKBRIDGE_ASK__API_KEY` maps
    /// to `ask.api_key`. Required keys may come from either source; the TOML
    /// file does not need to exist when everything is provided via
    /// environment.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: BridgeConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("ASKBRIDGE_").split("__"))
            .extract()
            .map_err(|e| crate::error::BridgeError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.askbridge/askbridge.toml", home)
}
