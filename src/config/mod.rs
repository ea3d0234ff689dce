//! Configuration module for the canvass backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::FixedOffset;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Shared key accepted by the finish-campaigns trigger
    pub scheduler_key: Option<String>,
    /// Seconds between automatic finish-campaigns runs; 0 disables the task
    pub finish_interval_secs: u64,
    /// Offset used for "today" boundaries and dates printed in exports
    pub display_offset: FixedOffset,
    /// Session lifetime in days
    pub session_days: i64,
    /// Bootstrap administrator created at start-up when missing
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

/// A configuration variable held a value that could not be parsed.
#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} value: {:?}", self.variable, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("CANVASS_DB_PATH")
            .unwrap_or_else(|_| "./data/canvass.sqlite".to_string())
            .into();

        let bind_addr = parse_var("CANVASS_BIND_ADDR", "127.0.0.1:8080")?;
        let log_level = env::var("CANVASS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let scheduler_key = env::var("CANVASS_SCHEDULER_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        let finish_interval_secs = parse_var("CANVASS_FINISH_INTERVAL_SECS", "300")?;

        let offset_minutes: i32 = parse_var("CANVASS_DISPLAY_OFFSET_MINUTES", "-180")?;
        let display_offset =
            FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| ConfigError {
                variable: "CANVASS_DISPLAY_OFFSET_MINUTES",
                value: offset_minutes.to_string(),
            })?;

        let session_days: i64 = parse_var("CANVASS_SESSION_DAYS", "7")?;
        if session_days <= 0 {
            return Err(ConfigError {
                variable: "CANVASS_SESSION_DAYS",
                value: session_days.to_string(),
            });
        }

        let admin_email = env::var("CANVASS_ADMIN_EMAIL").ok().filter(|e| !e.is_empty());
        let admin_password = env::var("CANVASS_ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            scheduler_key,
            finish_interval_secs,
            display_offset,
            session_days,
            admin_email,
            admin_password,
        })
    }
}

/// Read an environment variable, falling back to `default`, and parse it.
fn parse_var<T: std::str::FromStr>(variable: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(variable).unwrap_or_else(|_| default.to_string());
    value.trim().parse().map_err(|_| ConfigError { variable, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "CANVASS_DB_PATH",
        "CANVASS_BIND_ADDR",
        "CANVASS_LOG_LEVEL",
        "CANVASS_SCHEDULER_KEY",
        "CANVASS_FINISH_INTERVAL_SECS",
        "CANVASS_DISPLAY_OFFSET_MINUTES",
        "CANVASS_SESSION_DAYS",
        "CANVASS_ADMIN_EMAIL",
        "CANVASS_ADMIN_PASSWORD",
    ];

    // Both cases live in one test because they mutate process-wide env vars.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/canvass.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(config.scheduler_key.is_none());
        assert_eq!(config.finish_interval_secs, 300);
        assert_eq!(config.display_offset.local_minus_utc(), -3 * 3600);
        assert_eq!(config.session_days, 7);
        assert!(config.admin_email.is_none());

        env::set_var("CANVASS_BIND_ADDR", "not-an-address");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.variable, "CANVASS_BIND_ADDR");
        env::remove_var("CANVASS_BIND_ADDR");

        env::set_var("CANVASS_SESSION_DAYS", "0");
        assert!(Config::from_env().is_err());
        env::remove_var("CANVASS_SESSION_DAYS");
    }
}
