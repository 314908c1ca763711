use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_request_body_limit")]
    pub request_body_limit_bytes: usize,
    #[serde(default = "default_server_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_graceful_shutdown_seconds")]
    pub graceful_shutdown_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Name of the environment variable holding the upstream API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            request_body_limit_bytes: default_request_body_limit(),
            request_timeout_seconds: default_server_request_timeout(),
            graceful_shutdown_seconds: default_graceful_shutdown_seconds(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            tracing_level: default_tracing_level(),
            log_format: LogFormat::default(),
        }
    }
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8888".to_string()
}
fn default_request_body_limit() -> usize {
    65_536
}
fn default_server_request_timeout() -> u64 {
    35
}
fn default_graceful_shutdown_seconds() -> u64 {
    5
}
fn default_base_url() -> String {
    "https://api.deepseek.com".to_string()
}
fn default_model() -> String {
    "deepseek-chat".to_string()
}
fn default_max_tokens() -> u32 {
    1200
}
fn default_temperature() -> f32 {
    0.7
}
fn default_connect_timeout() -> u64 {
    10_000
}
fn default_request_timeout() -> u64 {
    30_000
}
fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}
fn default_tracing_level() -> String {
    "info".to_string()
}

/// Load configuration from `path`, or from `config.toml` when it exists.
///
/// An explicitly requested file must be readable; the default file is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_config(&config_str)
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
        None => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(config_str) => {
                parse_config(&config_str).context("Failed to parse config.toml")
            }
            Err(_) => Ok(Config::default()),
        },
    }
}

pub fn parse_config(config_str: &str) -> Result<Config> {
    Ok(toml::from_str(config_str)?)
}

/// Read the upstream API key from the environment.
///
/// Unset and empty values are both treated as "not configured".
pub fn load_api_key(env_name: &str) -> Option<SecretString> {
    std::env::var(env_name)
        .ok()
        .filter(|key| !key.is_empty())
        .map(SecretString::new)
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn graceful_shutdown_duration(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_seconds)
    }
}
