use std::{fmt::Display, str::FromStr};

use fanpush_engine::db_types::{BuyerId, Coins, OrderId};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// The query parameters accepted by the `/getfollowers` routes.
///
/// Every field is optional at the deserialization level so that a missing parameter surfaces as an
/// `INVALID_PARAMETERS` error from the handler, and not as a bare extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowerParams {
    pub user_id: Option<String>,
    pub version: Option<String>,
    pub coins: Option<String>,
    /// The number of fans being bought.
    pub value: Option<String>,
}

impl FollowerParams {
    pub fn buyer_id(&self) -> Result<BuyerId, ServerError> {
        match self.user_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(BuyerId::from(id)),
            _ => Err(ServerError::InvalidParameters("userId is required".into())),
        }
    }

    pub fn check_version(&self, expected: u32) -> Result<(), ServerError> {
        let version = required::<u32>("version", self.version.as_deref())?;
        if version == expected {
            Ok(())
        } else {
            Err(ServerError::InvalidParameters(format!("Unsupported API version {version}. Expected {expected}")))
        }
    }

    pub fn coins(&self) -> Result<Coins, ServerError> {
        required::<i64>("coins", self.coins.as_deref()).map(Coins::from)
    }

    pub fn fans(&self) -> Result<i64, ServerError> {
        required::<i64>("value", self.value.as_deref())
    }
}

fn required<T>(name: &str, value: Option<&str>) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = value.ok_or_else(|| ServerError::InvalidParameters(format!("{name} is required")))?;
    value.trim().parse::<T>().map_err(|e| ServerError::InvalidParameters(format!("{name} ({value}) is invalid. {e}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: BuyerId,
    pub coins: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub order_id: OrderId,
    /// The buyer's balance after the purchase.
    pub coins: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResponse {
    #[serde(rename = "userIDs")]
    pub user_ids: Vec<BuyerId>,
}
