use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::relay::Broadcaster;

pub const HOST_VAR: &str = "COMMANDDECK_HOST";
pub const PORT_VAR: &str = "COMMANDDECK_PORT";
pub const SEND_TIMEOUT_VAR: &str = "COMMANDDECK_SEND_TIMEOUT_MS";
pub const CORS_ORIGINS_VAR: &str = "COMMANDDECK_CORS_ORIGINS";

const DEFAULT_PORT: u16 = 8765;
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Browser origins allowed to call the relay
#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigins {
    Any,
    List(Vec<HeaderValue>),
}

/// Relay settings, read from `COMMANDDECK_*` environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Upper bound on one send to one subscriber
    pub send_timeout: Duration,
    pub cors_origins: CorsOrigins,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            send_timeout: Broadcaster::DEFAULT_SEND_TIMEOUT,
            cors_origins: CorsOrigins::List(
                DEFAULT_CORS_ORIGINS
                    .iter()
                    .copied()
                    .map(HeaderValue::from_static)
                    .collect(),
            ),
        }
    }
}

impl RelayConfig {
    /// Reads the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source; unset variables use defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |name: &'static str| {
            let value = lookup(name).filter(|value| !value.trim().is_empty());
            if value.is_none() {
                tracing::info!("{} not set, using default", name);
            }
            value
        };

        if let Some(value) = read(HOST_VAR) {
            config.host = value
                .trim()
                .parse()
                .map_err(|e: std::net::AddrParseError| invalid(HOST_VAR, &value, e))?;
        }

        if let Some(value) = read(PORT_VAR) {
            config.port = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(PORT_VAR, &value, e))?;
        }

        if let Some(value) = read(SEND_TIMEOUT_VAR) {
            let millis: u64 = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(SEND_TIMEOUT_VAR, &value, e))?;
            if millis == 0 {
                return Err(invalid(SEND_TIMEOUT_VAR, &value, "must be greater than zero"));
            }
            config.send_timeout = Duration::from_millis(millis);
        }

        if let Some(value) = read(CORS_ORIGINS_VAR) {
            config.cors_origins = parse_origins(&value)?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let origin = match &self.cors_origins {
            CorsOrigins::Any => AllowOrigin::any(),
            CorsOrigins::List(origins) => AllowOrigin::list(origins.clone()),
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

fn parse_origins(value: &str) -> Result<CorsOrigins, ConfigError> {
    if value.trim() == "*" {
        return Ok(CorsOrigins::Any);
    }

    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| invalid(CORS_ORIGINS_VAR, origin, e))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(CorsOrigins::List)
}

fn invalid(name: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
