/*
 * Responsibility
 * - Environment-based configuration for the demo server
 *   (AUTH_BASE_URL, optional REDIS_URL, allow-list, TTLs)
 * - Validation: missing required values fail startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    /// Base endpoint of the identity provider.
    pub auth_base_url: String,
    /// Presence enables the session cache.
    pub redis_url: Option<String>,
    pub cache_prefix: String,
    pub cache_ttl_seconds: u64,

    pub allowed_roles: Vec<String>,
    pub require_auth: bool,
    pub context_field: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let auth_base_url =
            std::env::var("AUTH_BASE_URL").map_err(|_| ConfigError::Missing("AUTH_BASE_URL"))?;

        let redis_url = std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty());

        let cache_prefix =
            std::env::var("CACHE_PREFIX").unwrap_or_else(|_| "tokens".to_string());

        let cache_ttl_seconds = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);

        let allowed_roles = std::env::var("ALLOWED_ROLES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let require_auth = std::env::var("REQUIRE_AUTH")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let context_field =
            std::env::var("CONTEXT_FIELD").unwrap_or_else(|_| "auth".to_string());

        Ok(Self {
            addr,
            app_env,
            auth_base_url,
            redis_url,
            cache_prefix,
            cache_ttl_seconds,
            allowed_roles,
            require_auth,
            context_field,
        })
    }
}
