// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, default values and the loaded [`AppConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the database and uploads | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWKS_URL` | JWKS endpoint for JWT verification | Required for production |
//! | `JWT_ISSUER` | Expected JWT issuer claim | Optional |
//! | `JWT_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `ACCESS_CACHE_CAPACITY` | Max cached access decisions | `10000` |
//! | `ACCESS_CACHE_TTL_SECS` | Access decision TTL | `60` |

use std::path::PathBuf;
use std::time::Duration;

use crate::storage::paths::DATA_ROOT;

/// Root directory holding `paywall.redb` and `uploads/`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 8080;

/// JWKS endpoint. When unset, tokens are only structurally decoded, which is
/// accepted in builds with the `dev` feature only.
pub const JWKS_URL_ENV: &str = "JWKS_URL";

pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const ACCESS_CACHE_CAPACITY_ENV: &str = "ACCESS_CACHE_CAPACITY";
pub const DEFAULT_ACCESS_CACHE_CAPACITY: usize = 10_000;

pub const ACCESS_CACHE_TTL_SECS_ENV: &str = "ACCESS_CACHE_TTL_SECS";
pub const DEFAULT_ACCESS_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got {value:?}")]
    InvalidValue {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Settings for the access decision cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub capacity: usize,
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_ACCESS_CACHE_CAPACITY,
            ttl: Duration::from_secs(DEFAULT_ACCESS_CACHE_TTL_SECS),
        }
    }
}

/// Configuration loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub jwks_url: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub log_format: LogFormat,
    pub cache: CacheSettings,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to resolve variables. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = parse_or(get(PORT_ENV), PORT_ENV, "port number", DEFAULT_PORT)?;
        let capacity = parse_or(
            get(ACCESS_CACHE_CAPACITY_ENV),
            ACCESS_CACHE_CAPACITY_ENV,
            "non-negative integer",
            DEFAULT_ACCESS_CACHE_CAPACITY,
        )?;
        let ttl_secs = parse_or(
            get(ACCESS_CACHE_TTL_SECS_ENV),
            ACCESS_CACHE_TTL_SECS_ENV,
            "number of seconds",
            DEFAULT_ACCESS_CACHE_TTL_SECS,
        )?;

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string())),
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            jwks_url: get(JWKS_URL_ENV),
            jwt_issuer: get(JWT_ISSUER_ENV),
            jwt_audience: get(JWT_AUDIENCE_ENV),
            log_format,
            cache: CacheSettings {
                capacity,
                ttl: Duration::from_secs(ttl_secs),
            },
        })
    }

    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var,
            expected,
            value,
        }),
    }
}
