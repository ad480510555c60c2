use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("upstream error: {0}")]
    UpstreamError(String),

    /// The price API knows no market for the requested pair. Shown to users as-is.
    #[error("{0}")]
    PriceUnavailable(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("malformed rpc value: {0}")]
    MalformedRpcValue(String),
}

impl CoreError {
    /// Whether the message is meant for the browser user rather than the logs.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CoreError::PriceUnavailable(_) | CoreError::InvalidArgument(_)
        )
    }
}

/// The RPC node could not complete a call. Routine (nodes flake), so callers
/// decide whether the missing result is fatal.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("rpc transport failure calling '{method}': {reason}")]
pub struct TransportFailure {
    pub method: String,
    pub reason: String,
}

/// Failure of a contract call: either the node could not be reached, or it
/// answered with something the caller cannot accept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractCallError {
    #[error(transparent)]
    Transport(#[from] TransportFailure),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub fn ensure_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidArgument(format!("{} must not be empty", field)));
    }
    Ok(())
}
