use crate::error::{ensure_non_empty, CoreError};
use crate::service::CachingPriceService;
use crate::types::PriceDetail;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Prices a list of symbols against one currency. All-or-nothing: one failed
/// symbol fails the whole call.
pub struct BulkPriceService {
    prices: Arc<CachingPriceService>,
}

impl BulkPriceService {
    pub fn new(prices: Arc<CachingPriceService>) -> Self {
        Self { prices }
    }

    /// Returns one detail per input symbol, in input order.
    pub async fn get_prices(
        &self,
        symbols: &[String],
        currency: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<PriceDetail>, CoreError> {
        if symbols.is_empty() {
            return Err(CoreError::InvalidArgument(
                "at least one asset symbol is required".to_string(),
            ));
        }
        ensure_non_empty("currency", currency)?;

        info!("pricing {} asset(s) in {}", symbols.len(), currency);
        try_join_all(
            symbols
                .iter()
                .map(|symbol| self.prices.get_price(symbol, currency, now, false)),
        )
        .await
    }
}

/// Index details by asset symbol. A repeated symbol is a caller bug.
pub fn build_lookup(details: Vec<PriceDetail>) -> Result<HashMap<String, PriceDetail>, CoreError> {
    let mut lookup = HashMap::with_capacity(details.len());
    for detail in details {
        let symbol = detail.asset_symbol().to_string();
        if lookup.insert(symbol.clone(), detail).is_some() {
            return Err(CoreError::DuplicateKey(format!(
                "asset symbol '{}' appears more than once",
                symbol
            )));
        }
    }
    Ok(lookup)
}
