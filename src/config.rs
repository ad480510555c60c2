use crate::service::{DEFAULT_CURRENCY, DEFAULT_FRESHNESS_WINDOW_MS};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub price_api: PriceApiConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// Asset symbols shown on the dashboard, priced by `prices` when no list is given.
    pub assets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceApiConfig {
    pub base_url: String,
    #[serde(default = "default_source_id")]
    pub source_id: String,
    #[serde(default = "default_freshness_window_ms")]
    pub freshness_window_ms: i64,
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn default_source_id() -> String {
    "cryptocompare".to_string()
}

fn default_freshness_window_ms() -> i64 {
    DEFAULT_FRESHNESS_WINDOW_MS
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.price_api.base_url.trim().is_empty() {
            anyhow::bail!("price_api.base_url must not be empty");
        }
        if self.price_api.default_currency.trim().is_empty() {
            anyhow::bail!("price_api.default_currency must not be empty");
        }
        if self.price_api.freshness_window_ms < 0 {
            anyhow::bail!(
                "price_api.freshness_window_ms must not be negative, got {}",
                self.price_api.freshness_window_ms
            );
        }
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be at least 1");
        }
        if self.assets.is_empty() {
            anyhow::bail!("assets must list at least one symbol");
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for symbol in &self.assets {
            if symbol.trim().is_empty() {
                anyhow::bail!("assets contains an empty symbol");
            }
            if !seen.insert(symbol.as_str()) {
                anyhow::bail!("duplicate asset symbol '{}'", symbol);
            }
        }
        Ok(())
    }
}
