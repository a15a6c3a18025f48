use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub sse: SseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

/// API key guarding the trigger endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SseConfig {
    /// Seconds between keep-alive comments on an idle stream
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval: u64,
    /// Frames buffered per connection before writes start waiting
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Upper bound on a single connection write during fan-out
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Reconnect hint sent to clients on shutdown
    #[serde(default = "default_reconnect_after_seconds")]
    pub reconnect_after_seconds: u64,
}

impl SseConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_interval)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_keep_alive_interval() -> u64 {
    15
}

fn default_channel_capacity() -> usize {
    32
}

fn default_send_timeout_ms() -> u64 {
    2000
}

fn default_reconnect_after_seconds() -> u64 {
    5
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("sse.keep_alive_interval", default_keep_alive_interval())?
            .set_default("sse.channel_capacity", default_channel_capacity() as u64)?
            .set_default("sse.send_timeout_ms", default_send_timeout_ms())?
            .set_default("sse.reconnect_after_seconds", default_reconnect_after_seconds())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, JWT__SECRET, SSE__SEND_TIMEOUT_MS, API__KEY, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make the SSE layer spin or never time out
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sse.keep_alive_interval == 0 {
            return Err(ConfigError::Message(
                "sse.keep_alive_interval must be at least 1 second".to_string(),
            ));
        }
        if self.sse.send_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "sse.send_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            keep_alive_interval: default_keep_alive_interval(),
            channel_capacity: default_channel_capacity(),
            send_timeout_ms: default_send_timeout_ms(),
            reconnect_after_seconds: default_reconnect_after_seconds(),
        }
    }
}
