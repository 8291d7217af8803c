//! Runtime configuration.
//!
//! Everything is read once at startup into an immutable [`Config`] and
//! passed down by reference. Values come from the process environment
//! (after a `.env` file has been merged in) and fall back to the defaults
//! the monitors have always used.

use crate::api::retry::RetryPolicy;
use crate::error::{KrakenWatchError, Result};
use crate::signal::oversold::OversoldCriteria;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.kraken.com/0/public";

/// Candle widths, in minutes, that Kraken's OHLC endpoint accepts.
pub const OHLC_INTERVALS: &[u32] = &[1, 5, 15, 30, 60, 240, 1440, 10080, 21600];

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub listings: ListingsConfig,
    pub oversold: OversoldConfig,
    pub email: EmailConfig,
    /// Directory for the per-run log file; console only when unset.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
}

#[derive(Debug, Clone)]
pub struct ListingsConfig {
    pub state_file: PathBuf,
    pub log_file: PathBuf,
    pub interval: Duration,
    pub alert_on_bootstrap: bool,
}

#[derive(Debug, Clone)]
pub struct OversoldConfig {
    pub interval: Duration,
    /// OHLC candle width in minutes.
    pub ohlc_interval: u32,
    pub criteria: OversoldCriteria,
    pub workers: usize,
    pub excluded_bases: Vec<String>,
    pub ledger_file: PathBuf,
    pub alert_cooldown: Duration,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub from: String,
    pub to: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub starttls: bool,
}

pub const DEFAULT_EXCLUDED_BASES: &[&str] = &[
    "USD", "USDT", "USDC", "EUR", "GBP", "DAI", "CHF", "CAD", "JPY", "TRY", "TUSD", "USDD",
    "UUSD", "GUSD",
];

/// Typed reads over an arbitrary key lookup.
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.raw(key) {
            Some(v) => v.parse::<T>().map_err(|e| KrakenWatchError::ConfigError {
                key: key.to_string(),
                reason: format!("'{}': {}", v, e),
            }),
            None => Ok(default),
        }
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.raw(key) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(KrakenWatchError::ConfigError {
                    key: key.to_string(),
                    reason: format!("'{}' is not a boolean", v),
                }),
            },
        }
    }

    fn secs(&self, key: &str, default: u64) -> Result<Duration> {
        self.parse(key, default).map(Duration::from_secs)
    }

    fn millis(&self, key: &str, default: u64) -> Result<Duration> {
        self.parse(key, default).map(Duration::from_millis)
    }
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let defaults = OversoldCriteria::default();

        let retry = RetryPolicy {
            max_attempts: vars.parse("RETRY_MAX_ATTEMPTS", 3)?,
            base_delay: vars.millis("RETRY_BASE_MS", 500)?,
            max_delay: vars.millis("RETRY_MAX_MS", 10_000)?,
            multiplier: 2.0,
        };

        let api = ApiConfig {
            base_url: vars
                .string("KRAKEN_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout: vars.secs("HTTP_TIMEOUT_SECS", 15)?,
            retry,
            breaker_threshold: vars.parse("BREAKER_THRESHOLD", 5)?,
            breaker_cooldown: vars.secs("BREAKER_COOLDOWN_SECS", 300)?,
        };

        let listings = ListingsConfig {
            state_file: vars
                .string(
                    "LISTINGS_STATE_FILE",
                    "/var/lib/kraken_newlistings/seen_pairs.json",
                )
                .into(),
            log_file: vars
                .string("LISTINGS_LOG_FILE", "/var/log/kraken_newlistings.log")
                .into(),
            interval: vars.secs("LISTINGS_INTERVAL_SECS", 60)?,
            alert_on_bootstrap: vars.flag("LISTINGS_ALERT_ON_BOOTSTRAP", false)?,
        };

        let criteria = OversoldCriteria {
            min_candles: defaults.min_candles,
            rsi_length: vars.parse("OVERSOLD_RSI_LENGTH", defaults.rsi_length)?,
            rsi_max: vars.parse("OVERSOLD_RSI_MAX", defaults.rsi_max)?,
            stoch_k: vars.parse("OVERSOLD_STOCH_K", defaults.stoch_k)?,
            stoch_d: vars.parse("OVERSOLD_STOCH_D", defaults.stoch_d)?,
            stoch_max: vars.parse("OVERSOLD_STOCH_MAX", defaults.stoch_max)?,
            support_window: vars.parse("OVERSOLD_SUPPORT_WINDOW", defaults.support_window)?,
            support_tolerance: vars
                .parse("OVERSOLD_SUPPORT_TOLERANCE", defaults.support_tolerance)?,
            min_price: vars.parse("OVERSOLD_MIN_PRICE", defaults.min_price)?,
            max_price: vars.parse("OVERSOLD_MAX_PRICE", defaults.max_price)?,
            min_volume: vars.parse("OVERSOLD_MIN_VOLUME", defaults.min_volume)?,
        };

        let excluded_bases = match vars.raw("OVERSOLD_EXCLUDED_BASES") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_EXCLUDED_BASES.iter().map(|s| s.to_string()).collect(),
        };

        let oversold = OversoldConfig {
            interval: vars.secs("OVERSOLD_INTERVAL_SECS", 900)?,
            ohlc_interval: vars.parse("OVERSOLD_OHLC_INTERVAL", 15)?,
            criteria,
            workers: vars.parse("OVERSOLD_WORKERS", 8)?,
            excluded_bases,
            ledger_file: vars
                .string("OVERSOLD_LEDGER_FILE", "/var/lib/kraken_oversold/alerted.json")
                .into(),
            alert_cooldown: vars.secs("OVERSOLD_ALERT_COOLDOWN_SECS", 6 * 3600)?,
        };

        let email = EmailConfig {
            enabled: vars.flag("EMAIL_ENABLED", true)?,
            from: vars.string("EMAIL_FROM", "stockalerts@maximized.site"),
            to: vars.string("EMAIL_TO", "maxdaylight@maximized.site"),
            smtp_host: vars.string("SMTP_HOST", "192.168.0.240"),
            smtp_port: vars.parse("SMTP_PORT", 25)?,
            username: vars.raw("SMTP_USERNAME"),
            password: vars.raw("SMTP_PASSWORD"),
            starttls: vars.flag("SMTP_STARTTLS", false)?,
        };

        let config = Config {
            api,
            listings,
            oversold,
            email,
            log_dir: vars.raw("LOG_DIR").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |key: &str, reason: &str| {
            Err(KrakenWatchError::ConfigError {
                key: key.to_string(),
                reason: reason.to_string(),
            })
        };

        let c = &self.oversold.criteria;
        if self.api.retry.max_attempts == 0 {
            return invalid("RETRY_MAX_ATTEMPTS", "must be at least 1");
        }
        if self.api.breaker_threshold == 0 {
            return invalid("BREAKER_THRESHOLD", "must be at least 1");
        }
        if !OHLC_INTERVALS.contains(&self.oversold.ohlc_interval) {
            return invalid(
                "OVERSOLD_OHLC_INTERVAL",
                "must be one of 1, 5, 15, 30, 60, 240, 1440, 10080, 21600",
            );
        }
        if self.oversold.workers == 0 {
            return invalid("OVERSOLD_WORKERS", "must be at least 1");
        }
        if c.rsi_length == 0 {
            return invalid("OVERSOLD_RSI_LENGTH", "must be at least 1");
        }
        if c.stoch_k == 0 {
            return invalid("OVERSOLD_STOCH_K", "must be at least 1");
        }
        if c.stoch_d == 0 {
            return invalid("OVERSOLD_STOCH_D", "must be at least 1");
        }
        if c.support_window == 0 {
            return invalid("OVERSOLD_SUPPORT_WINDOW", "must be at least 1");
        }
        if c.min_price >= c.max_price {
            return invalid("OVERSOLD_MIN_PRICE", "must be below OVERSOLD_MAX_PRICE");
        }
        if self.email.username.is_some() != self.email.password.is_some() {
            return invalid("SMTP_USERNAME", "username and password must be set together");
        }
        Ok(())
    }
}
