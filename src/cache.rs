use crate::error::{ensure_non_empty, CoreError};
use crate::types::PriceDetail;
use dashmap::DashMap;

/// Latest known price per asset symbol, for the life of the process.
///
/// No eviction and no expiry: freshness is decided by the caller
/// (see `CachingPriceService`).
#[derive(Debug, Default)]
pub struct PriceCache {
    entries: DashMap<String, PriceDetail>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Result<Option<PriceDetail>, CoreError> {
        ensure_non_empty("asset symbol", symbol)?;
        Ok(self.entries.get(symbol).map(|entry| entry.value().clone()))
    }

    /// Upsert. Returns whether an entry for `symbol` existed before.
    pub fn set(&self, symbol: &str, detail: PriceDetail) -> Result<bool, CoreError> {
        ensure_non_empty("asset symbol", symbol)?;
        Ok(self.entries.insert(symbol.to_string(), detail).is_some())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
