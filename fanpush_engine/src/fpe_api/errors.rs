use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{BuyerId, Coins, RecordShapeError},
    traits::{BuyerApiError, PushGatewayError},
};

/// A stable, machine-readable classification of [`SchedulerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidParameters,
    InsufficientFunds,
    NotFound,
    NoCandidates,
    StoreOperationFailure,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParameters => "INVALID_PARAMETERS",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::NoCandidates => "NO_CANDIDATES",
            ErrorKind::StoreOperationFailure => "STORE_OPERATION_FAILURE",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Buyer {buyer_id} cannot spend {requested}; the balance is only {available}")]
    InsufficientFunds { buyer_id: BuyerId, requested: Coins, available: Coins },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No orders are due for buyer {0}")]
    NoCandidates(BuyerId),
    #[error("Store operation failed: {0}")]
    StoreOperationFailure(String),
}

impl SchedulerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::InvalidParameters(_) => ErrorKind::InvalidParameters,
            SchedulerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            SchedulerError::NotFound(_) => ErrorKind::NotFound,
            SchedulerError::NoCandidates(_) => ErrorKind::NoCandidates,
            SchedulerError::StoreOperationFailure(_) => ErrorKind::StoreOperationFailure,
        }
    }

    /// Only store failures are worth retrying. Everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchedulerError::StoreOperationFailure(_))
    }

    pub fn buyer_not_found(buyer_id: &BuyerId) -> Self {
        SchedulerError::NotFound(format!("Buyer {buyer_id} does not exist"))
    }
}

impl From<PushGatewayError> for SchedulerError {
    fn from(e: PushGatewayError) -> Self {
        match e {
            PushGatewayError::InsufficientFunds { buyer_id, requested, available } => {
                SchedulerError::InsufficientFunds { buyer_id, requested, available }
            },
            PushGatewayError::BuyerNotFound(buyer_id) => SchedulerError::buyer_not_found(&buyer_id),
            e => SchedulerError::StoreOperationFailure(e.to_string()),
        }
    }
}

impl From<BuyerApiError> for SchedulerError {
    fn from(e: BuyerApiError) -> Self {
        SchedulerError::StoreOperationFailure(e.to_string())
    }
}

/// Startup failures. Any of these must stop the process from serving requests.
#[derive(Debug, Clone, Error)]
pub enum BootstrapError {
    #[error("Could not load pending orders from the store: {0}")]
    StoreUnavailable(String),
    #[error("The store holds an invalid order record. {0}")]
    InvalidOrderRecord(#[from] RecordShapeError),
}
