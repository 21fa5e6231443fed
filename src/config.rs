// src/config.rs
use chrono::{FixedOffset, Offset, Utc};
use std::net::SocketAddr;
use thiserror::Error;

/// Asia/Kolkata has no daylight saving, so a fixed +05:30 offset is exact.
const CAMPUS_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

pub fn campus_timezone() -> FixedOffset {
    FixedOffset::east_opt(CAMPUS_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub database_url: String,
    pub gemini_model: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub admin_username: String,
    pub admin_password: String,
    /// True when the bootstrap admin falls back to the built-in password.
    pub admin_password_is_default: bool,
}

impl AppConfig {
    /// Read configuration from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid { key: "BIND_ADDR", value: bind_raw.clone() })?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", value: raw })?,
            None => 5,
        };

        let admin_password = get("ADMIN_PASSWORD");

        Ok(Self {
            gemini_api_key,
            database_url,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            bind_addr,
            db_max_connections,
            admin_username: get("ADMIN_USERNAME").unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_password_is_default: admin_password.is_none(),
            admin_password: admin_password.unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/uni")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_database_url_counts_as_missing() {
        let err = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k"), ("DATABASE_URL", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("DATABASE_URL", "postgres://localhost/uni"),
        ]))
        .unwrap();
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.admin_username, "admin");
        assert!(config.admin_password_is_default);
    }

    #[test]
    fn test_invalid_bind_addr_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("DATABASE_URL", "postgres://localhost/uni"),
            ("BIND_ADDR", "not-an-addr"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BIND_ADDR", .. }));
    }

    #[test]
    fn test_campus_timezone_is_ist() {
        assert_eq!(campus_timezone().local_minus_utc(), 19800);
    }
}
