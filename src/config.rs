//! Runtime configuration from environment variables
//!
//! `.env` is loaded by the binary before `NotifierConfig::from_env` runs.

use std::env;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "games.db";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_INITIAL_DELAY_SECS: u64 = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_UPDATES_POLL_SECS: u64 = 30;

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for the bot runtime
///
/// Not `Debug`: it carries the bot token.
#[derive(Clone)]
pub struct NotifierConfig {
    pub telegram_token: String,
    pub db_path: String,
    pub check_interval: Duration,
    pub initial_delay: Duration,
    pub http_timeout: Duration,
    /// Long-poll window for the Telegram update feed
    pub updates_poll_timeout: Duration,
    pub rust_log: String,
}

impl NotifierConfig {
    /// Environment variables:
    /// - `TELEGRAM_TOKEN` (required)
    /// - `DATABASE_PATH` (default: games.db)
    /// - `CHECK_INTERVAL_SECS`, or legacy `CHECK_INTERVAL` (default: 3600)
    /// - `INITIAL_DELAY_SECS` (default: 10)
    /// - `HTTP_TIMEOUT_SECS` (default: 20)
    /// - `UPDATES_POLL_SECS` (default: 30)
    /// - `RUST_LOG` (default: info)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_token = lookup("TELEGRAM_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingVariable("TELEGRAM_TOKEN".to_string()))?;

        let db_path = lookup("DATABASE_PATH")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let check_interval = seconds(
            &lookup,
            &["CHECK_INTERVAL_SECS", "CHECK_INTERVAL"],
            DEFAULT_CHECK_INTERVAL_SECS,
            false,
        )?;
        let initial_delay = seconds(&lookup, &["INITIAL_DELAY_SECS"], DEFAULT_INITIAL_DELAY_SECS, true)?;
        let http_timeout = seconds(&lookup, &["HTTP_TIMEOUT_SECS"], DEFAULT_HTTP_TIMEOUT_SECS, false)?;
        let updates_poll_timeout =
            seconds(&lookup, &["UPDATES_POLL_SECS"], DEFAULT_UPDATES_POLL_SECS, true)?;

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            telegram_token,
            db_path,
            check_interval,
            initial_delay,
            http_timeout,
            updates_poll_timeout,
            rust_log,
        })
    }
}

/// First variable in `names` that is set wins; unparseable values fall back
/// to the default
fn seconds<F>(lookup: &F, names: &[&str], default: u64, allow_zero: bool) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let found = names
        .iter()
        .find_map(|name| lookup(name).map(|value| (*name, value)));

    let secs = match found {
        Some((name, raw)) => match raw.trim().parse::<u64>() {
            Ok(secs) => {
                if secs == 0 && !allow_zero {
                    return Err(ConfigError::InvalidValue(format!("{} must be greater than 0", name)));
                }
                secs
            }
            Err(_) => {
                log::warn!("Invalid {} '{}', defaulting to {}s", name, raw, default);
                default
            }
        },
        None => default,
    };

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = NotifierConfig::from_lookup(lookup(&[("TELEGRAM_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.db_path, "games.db");
        assert_eq!(config.check_interval, Duration::from_secs(3600));
        assert_eq!(config.initial_delay, Duration::from_secs(10));
        assert_eq!(config.http_timeout, Duration::from_secs(20));
        assert_eq!(config.updates_poll_timeout, Duration::from_secs(30));
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_custom_config() {
        let config = NotifierConfig::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "123:abc"),
            ("DATABASE_PATH", "/tmp/test.db"),
            ("CHECK_INTERVAL_SECS", "900"),
            ("INITIAL_DELAY_SECS", "0"),
            ("HTTP_TIMEOUT_SECS", "5"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, "/tmp/test.db");
        assert_eq!(config.check_interval, Duration::from_secs(900));
        assert_eq!(config.initial_delay, Duration::ZERO);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.rust_log, "debug");
    }

    #[test]
    fn test_legacy_interval_name_and_precedence() {
        let legacy = NotifierConfig::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "t"),
            ("CHECK_INTERVAL", "60"),
        ]))
        .unwrap();
        assert_eq!(legacy.check_interval, Duration::from_secs(60));

        let both = NotifierConfig::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "t"),
            ("CHECK_INTERVAL", "60"),
            ("CHECK_INTERVAL_SECS", "120"),
        ]))
        .unwrap();
        assert_eq!(both.check_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_invalid_values() {
        let garbage = NotifierConfig::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "t"),
            ("CHECK_INTERVAL_SECS", "hourly"),
        ]))
        .unwrap();
        assert_eq!(garbage.check_interval, Duration::from_secs(3600));

        let zero = NotifierConfig::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "t"),
            ("CHECK_INTERVAL_SECS", "0"),
        ]));
        assert!(matches!(zero, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(
            NotifierConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingVariable(var)) if var == "TELEGRAM_TOKEN"
        ));
        assert!(matches!(
            NotifierConfig::from_lookup(lookup(&[("TELEGRAM_TOKEN", "  ")])),
            Err(ConfigError::MissingVariable(_))
        ));
    }
}
