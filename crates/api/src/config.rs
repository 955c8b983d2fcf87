//! Server configuration, loaded from environment variables with defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::http::StatusCode;
use thiserror::Error;

use reelpipe_auth::DEFAULT_TOKEN_TTL_SECS;

const DEV_JWT_SECRET: &str = "dev-secret";

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// Status for requests no route matched.
    pub not_found_status: StatusCode,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            not_found_status: StatusCode::NOT_FOUND,
        }
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("not_found_status", &self.not_found_status)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `REELPIPE_HOST`: bind address (default: 0.0.0.0)
    /// - `REELPIPE_PORT`: port (default: 3000)
    /// - `JWT_SECRET`: token signing secret (default: insecure dev secret)
    /// - `JWT_TTL_SECS`: token lifetime in seconds (default: 3600, at most one year)
    /// - `REELPIPE_NOT_FOUND_STATUS`: status for unmatched requests (default: 404)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(val) = lookup("REELPIPE_HOST") {
            config.host = val
                .parse()
                .map_err(|_| ConfigError::invalid("REELPIPE_HOST", &val))?;
        }

        if let Some(val) = lookup("REELPIPE_PORT") {
            config.port = val
                .parse()
                .map_err(|_| ConfigError::invalid("REELPIPE_PORT", &val))?;
        }

        match lookup("JWT_SECRET") {
            Some(val) if !val.is_empty() => config.jwt_secret = val,
            _ => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        if let Some(val) = lookup("JWT_TTL_SECS") {
            config.token_ttl_secs = val
                .parse()
                .ok()
                .filter(|secs: &i64| (1..=MAX_TOKEN_TTL_SECS).contains(secs))
                .ok_or_else(|| ConfigError::invalid("JWT_TTL_SECS", &val))?;
        }

        if let Some(val) = lookup("REELPIPE_NOT_FOUND_STATUS") {
            config.not_found_status = val
                .parse::<u16>()
                .ok()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|status| !status.is_informational())
                .ok_or_else(|| ConfigError::invalid("REELPIPE_NOT_FOUND_STATUS", &val))?;
        }

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Token lifetime, clamped to `1..=MAX_TOKEN_TTL_SECS` for hand-built configs.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_secs.clamp(1, MAX_TOKEN_TTL_SECS))
    }
}
