//! Device configuration, fixed at boot.
//!
//! Read from `TAGNODE_*` environment variables. Only the role is mandatory to get
//! right: an unknown role is a boot error, while unparseable numbers fall back to
//! their defaults.

use crate::error::DeviceError;
use crate::types::{
    DeviceRole, WifiCredentials, CONNECT_TIMEOUT_MS, DEBOUNCE_MS, DEFAULT_SERVER_PORT,
    LINK_RETRY_MS, LINK_TIMEOUT_MS, POLL_TIMEOUT_MS,
};

pub const ENV_ROLE: &str = "TAGNODE_ROLE";
pub const ENV_WIFI_SSID: &str = "TAGNODE_WIFI_SSID";
pub const ENV_WIFI_PASSWORD: &str = "TAGNODE_WIFI_PASSWORD";
pub const ENV_SERVER_HOST: &str = "TAGNODE_SERVER_HOST";
pub const ENV_SERVER_PORT: &str = "TAGNODE_SERVER_PORT";
pub const ENV_DEBOUNCE_MS: &str = "TAGNODE_DEBOUNCE_MS";
pub const ENV_POLL_TIMEOUT_MS: &str = "TAGNODE_POLL_TIMEOUT_MS";
pub const ENV_LINK_TIMEOUT_MS: &str = "TAGNODE_LINK_TIMEOUT_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "TAGNODE_CONNECT_TIMEOUT_MS";
pub const ENV_LINK_RETRY_MS: &str = "TAGNODE_LINK_RETRY_MS";
pub const ENV_WIRE_LOG_PATH: &str = "TAGNODE_WIRE_LOG_PATH";

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub role: DeviceRole,
    pub credentials: WifiCredentials,
    pub server_host: String,
    pub server_port: u16,
    pub debounce_ms: u64,
    pub poll_timeout_ms: u64,
    pub link_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub link_retry_ms: u64,
    pub wire_log_path: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            role: DeviceRole::Door,
            credentials: WifiCredentials::default(),
            server_host: "127.0.0.1".to_string(),
            server_port: DEFAULT_SERVER_PORT,
            debounce_ms: DEBOUNCE_MS,
            poll_timeout_ms: POLL_TIMEOUT_MS,
            link_timeout_ms: LINK_TIMEOUT_MS,
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            link_retry_ms: LINK_RETRY_MS,
            wire_log_path: None,
        }
    }
}

impl DeviceConfig {
    /// Defaults for `role`
    pub fn for_role(role: DeviceRole) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, DeviceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DeviceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let role = match lookup(ENV_ROLE) {
            Some(raw) => DeviceRole::from_str(&raw).ok_or_else(|| {
                DeviceError::Config(format!("unknown {} {:?}", ENV_ROLE, raw))
            })?,
            None => defaults.role,
        };

        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        let server_port = lookup(ENV_SERVER_PORT)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.server_port);

        let wire_log_path = lookup(ENV_WIRE_LOG_PATH)
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        Ok(Self {
            role,
            credentials: WifiCredentials::new(
                lookup(ENV_WIFI_SSID).unwrap_or_default(),
                lookup(ENV_WIFI_PASSWORD).unwrap_or_default(),
            ),
            server_host: lookup(ENV_SERVER_HOST).unwrap_or(defaults.server_host),
            server_port,
            debounce_ms: number(ENV_DEBOUNCE_MS, defaults.debounce_ms),
            poll_timeout_ms: number(ENV_POLL_TIMEOUT_MS, defaults.poll_timeout_ms),
            link_timeout_ms: number(ENV_LINK_TIMEOUT_MS, defaults.link_timeout_ms),
            connect_timeout_ms: number(ENV_CONNECT_TIMEOUT_MS, defaults.connect_timeout_ms),
            link_retry_ms: number(ENV_LINK_RETRY_MS, defaults.link_retry_ms),
            wire_log_path,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
