pub mod cryptocompare;

use crate::error::CoreError;
use crate::types::PriceDetail;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::warn;

#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch one `symbol`/`currency` pair. The returned detail is stamped with `now`.
    async fn fetch(
        &self,
        symbol: &str,
        currency: &str,
        now: DateTime<Utc>,
    ) -> Result<PriceDetail, CoreError>;
}

/// Send `request`, retrying once after `backoff` if the first attempt failed
/// before any response arrived (timeout, connect or send error).
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    backoff: Duration,
    label: &str,
) -> reqwest::Result<reqwest::Response> {
    let retry = request.try_clone();
    match request.send().await {
        Ok(resp) => Ok(resp),
        Err(e) if is_transient(&e) => match retry {
            Some(retry) => {
                warn!("{} failed ({}); retrying once in {:?}", label, e, backoff);
                tokio::time::sleep(backoff).await;
                retry.send().await
            }
            None => Err(e),
        },
        Err(e) => Err(e),
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}
