use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_API_BASE_URL: &str = "https://api.frankfurter.dev/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_url: String,
    pub bucket_name: String,
    pub api_base_url: String,
    pub base_currency: String,
    pub target_currency: String,
    pub http_timeout: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::Configuration(format!("{key} is not set")))
        };
        let optional = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(default)
        };

        let min_delay_ms = number("FX_MIN_DELAY_MS", 1000);
        let max_delay_ms = number("FX_MAX_DELAY_MS", 2000);
        let timeout_secs = match number("HTTP_TIMEOUT_SECS", 10) {
            0 => 10,
            secs => secs,
        };

        Ok(Self {
            webhook_url: required("WEBHOOK_URL")?,
            bucket_name: required("S3_BUCKET_NAME")?,
            api_base_url: optional("FX_API_BASE_URL", DEFAULT_API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            base_currency: optional("FX_BASE_CURRENCY", "USD"),
            target_currency: optional("FX_TARGET_CURRENCY", "KRW"),
            http_timeout: Duration::from_secs(timeout_secs),
            min_delay: Duration::from_millis(min_delay_ms.min(max_delay_ms)),
            max_delay: Duration::from_millis(min_delay_ms.max(max_delay_ms)),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config(webhook_url: &str, api_base_url: &str) -> Config {
    Config {
        webhook_url: webhook_url.to_string(),
        bucket_name: "fx-bucket".to_string(),
        api_base_url: api_base_url.to_string(),
        base_currency: "USD".to_string(),
        target_currency: "KRW".to_string(),
        http_timeout: Duration::from_secs(10),
        min_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    }
}
