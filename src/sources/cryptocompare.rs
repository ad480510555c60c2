use super::{send_with_retry, PriceSource};
use crate::error::CoreError;
use crate::types::PriceDetail;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

const NO_MARKET_MESSAGE: &str = "market does not exist for this coin pair";

pub struct CryptoCompare {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    source_id: String,
    retry_backoff: Duration,
}

impl CryptoCompare {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        source_id: String,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            source_id,
            retry_backoff,
        }
    }
}

#[async_trait]
impl PriceSource for CryptoCompare {
    fn name(&self) -> &str {
        &self.source_id
    }

    async fn fetch(
        &self,
        symbol: &str,
        currency: &str,
        now: DateTime<Utc>,
    ) -> Result<PriceDetail, CoreError> {
        let mut query = vec![("fsym", symbol), ("tsyms", currency)];
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.as_str()));
        }

        info!("[{}] fetching {}/{}", self.source_id, symbol, currency);
        let request = self.client.get(&self.base_url).query(&query);
        let label = format!("{} request for {}/{}", self.source_id, symbol, currency);
        let resp = send_with_retry(request, self.retry_backoff, &label)
            .await
            .map_err(|e| CoreError::UpstreamError(format!("{} failed: {}", label, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CoreError::UpstreamError(format!(
                "{} HTTP {}: {}",
                self.source_id, status, body
            )));
        }

        let body: Value = resp.json().await.map_err(|e| {
            CoreError::UpstreamError(format!("{} parse failed: {}", self.source_id, e))
        })?;

        parse_price_response(&body, symbol, currency, &self.source_id, now)
    }
}

/// Interpret a price API reply: `{ "<CUR>": <float> }` on success,
/// `{ "Response": "Error", "Message": "..." }` on failure.
pub fn parse_price_response(
    body: &Value,
    symbol: &str,
    currency: &str,
    source_id: &str,
    now: DateTime<Utc>,
) -> Result<PriceDetail, CoreError> {
    if body.get("Response").and_then(Value::as_str) == Some("Error") {
        let message = body
            .get("Message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        if message.to_lowercase().contains(NO_MARKET_MESSAGE) {
            return Err(CoreError::PriceUnavailable(format!(
                "No price is available for {} in {}. Try another currency.",
                symbol, currency
            )));
        }
        return Err(CoreError::UpstreamError(message.to_string()));
    }

    let field = body.get(currency).ok_or_else(|| {
        CoreError::UpstreamError(format!(
            "response missing expected field '{}' for {}",
            currency, symbol
        ))
    })?;

    let price = field.as_f64().ok_or_else(|| {
        CoreError::UpstreamError(format!(
            "non-numeric price for {}/{}: {}",
            symbol, currency, field
        ))
    })?;

    if price <= 0.0 {
        return Err(CoreError::UpstreamError(format!(
            "non-positive price for {}/{}: {}",
            symbol, currency, price
        )));
    }

    PriceDetail::new(symbol, price, currency, source_id, now)
}
