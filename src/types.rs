use crate::error::{ensure_non_empty, ContractCallError, CoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One asset's price in one currency, as produced by a single upstream fetch.
///
/// Only constructible through [`PriceDetail::new`], so every value in the
/// program has a non-empty symbol/currency/source and a strictly positive price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDetail {
    asset_symbol: String,
    asset_price: f64,
    denominated_in_currency: String,
    source_api_id: String,
    fetched_at: DateTime<Utc>,
}

impl PriceDetail {
    pub fn new(
        asset_symbol: impl Into<String>,
        asset_price: f64,
        denominated_in_currency: impl Into<String>,
        source_api_id: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        let asset_symbol = asset_symbol.into();
        let denominated_in_currency = denominated_in_currency.into();
        let source_api_id = source_api_id.into();

        ensure_non_empty("asset symbol", &asset_symbol)?;
        ensure_non_empty("denomination currency", &denominated_in_currency)?;
        ensure_non_empty("source api id", &source_api_id)?;
        if !asset_price.is_finite() || asset_price <= 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "asset price for {} must be positive, got {}",
                asset_symbol, asset_price
            )));
        }

        Ok(Self {
            asset_symbol,
            asset_price,
            denominated_in_currency,
            source_api_id,
            fetched_at,
        })
    }

    pub fn asset_symbol(&self) -> &str {
        &self.asset_symbol
    }

    pub fn asset_price(&self) -> f64 {
        self.asset_price
    }

    pub fn denominated_in_currency(&self) -> &str {
        &self.denominated_in_currency
    }

    pub fn source_api_id(&self) -> &str {
        &self.source_api_id
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// JSON envelope the page layer expects from every price/contract route.
#[derive(Debug, Clone, Serialize)]
pub struct ApiEnvelope<T> {
    pub is_error: bool,
    pub message: String,
    pub is_error_shown_to_user: bool,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            is_error: false,
            message: String::new(),
            is_error_shown_to_user: false,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>, shown_to_user: bool) -> Self {
        Self {
            is_error: true,
            message: message.into(),
            is_error_shown_to_user: shown_to_user,
            data: None,
        }
    }

    pub fn from_result(result: Result<T, CoreError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::error(e.to_string(), e.is_user_facing()),
        }
    }

    /// An unreachable node is reported but not shown; the page retries on its own.
    pub fn from_contract_result(result: Result<T, ContractCallError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(ContractCallError::Core(e)) => Self::from_result(Err(e)),
            Err(e @ ContractCallError::Transport(_)) => Self::error(e.to_string(), false),
        }
    }
}
