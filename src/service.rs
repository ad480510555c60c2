use crate::cache::PriceCache;
use crate::error::{ensure_non_empty, CoreError};
use crate::sources::PriceSource;
use crate::types::PriceDetail;
use async_singleflight::UnaryGroup;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_FRESHNESS_WINDOW_MS: i64 = 60_000;
pub const DEFAULT_CURRENCY: &str = "USD";

/// Serves prices from the shared cache while they are fresh, fetching from
/// the upstream source otherwise. Concurrent misses for the same
/// symbol/currency pair share one upstream call.
pub struct CachingPriceService {
    cache: Arc<PriceCache>,
    source: Arc<dyn PriceSource>,
    freshness_window: TimeDelta,
    default_currency: String,
    /// Followers receive the leader's result, errors included.
    in_flight: UnaryGroup<String, Result<PriceDetail, CoreError>>,
}

impl CachingPriceService {
    pub fn new(cache: Arc<PriceCache>, source: Arc<dyn PriceSource>) -> Self {
        Self {
            cache,
            source,
            freshness_window: TimeDelta::milliseconds(DEFAULT_FRESHNESS_WINDOW_MS),
            default_currency: DEFAULT_CURRENCY.to_string(),
            in_flight: UnaryGroup::new(),
        }
    }

    pub fn with_freshness_window(mut self, window: TimeDelta) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = currency.into();
        self
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    /// A cached detail is usable iff it is in the requested currency and no
    /// older than the freshness window at `now`.
    pub fn is_fresh(&self, cached: &PriceDetail, currency: &str, now: DateTime<Utc>) -> bool {
        cached.denominated_in_currency() == currency
            && now.signed_duration_since(cached.fetched_at()) <= self.freshness_window
    }

    pub async fn get_price(
        &self,
        symbol: &str,
        currency: &str,
        now: DateTime<Utc>,
        force_refresh: bool,
    ) -> Result<PriceDetail, CoreError> {
        ensure_non_empty("asset symbol", symbol)?;
        ensure_non_empty("currency", currency)?;

        if !force_refresh {
            if let Some(cached) = self.cache.get(symbol)? {
                if self.is_fresh(&cached, currency, now) {
                    debug!("cache hit for {}/{}", symbol, currency);
                    return Ok(cached);
                }
                debug!(
                    "cached {} is stale or in {}; refetching in {}",
                    symbol,
                    cached.denominated_in_currency(),
                    currency
                );
            }
        }

        let key = format!("{}|{}", symbol, currency);
        self.in_flight
            .work(&key, self.fetch_and_store(symbol, currency, now))
            .await
    }

    async fn fetch_and_store(
        &self,
        symbol: &str,
        currency: &str,
        now: DateTime<Utc>,
    ) -> Result<PriceDetail, CoreError> {
        let detail = self.source.fetch(symbol, currency, now).await?;
        let replaced = self.cache.set(symbol, detail.clone())?;
        info!(
            "[{}] {} = {:.8} {} (cache {})",
            self.source.name(),
            symbol,
            detail.asset_price(),
            currency,
            if replaced { "updated" } else { "filled" }
        );
        Ok(detail)
    }
}
