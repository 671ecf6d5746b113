use thiserror::Error;

use crate::db_types::{Buyer, BuyerId, Coins, Order, OrderId};

#[derive(Debug, Clone, Error)]
pub enum BuyerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for BuyerApiError {
    fn from(e: sqlx::Error) -> Self {
        BuyerApiError::DatabaseError(e.to_string())
    }
}

/// The `BuyerManagement` trait provides methods for querying buyers and their orders.
///
/// None of these methods touch coin balances or order progress. The [`FanPushDatabase`] trait handles all of that.
///
/// [`FanPushDatabase`]: crate::traits::FanPushDatabase
#[allow(async_fn_in_trait)]
pub trait BuyerManagement {
    /// Fetches the buyer record for the given id. If no buyer exists, `None` is returned.
    async fn fetch_buyer(&self, buyer_id: &BuyerId) -> Result<Option<Buyer>, BuyerApiError>;

    /// Fetches the buyer record for the given id, creating a zero-balance buyer if it does not exist yet.
    ///
    /// Only read paths may use this. Pushes never create buyers.
    async fn fetch_or_create_buyer(&self, buyer_id: &BuyerId) -> Result<Buyer, BuyerApiError>;

    /// All orders owned by the buyer, completed or not, oldest first.
    async fn fetch_orders_for_buyer(&self, buyer_id: &BuyerId) -> Result<Vec<Order>, BuyerApiError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, BuyerApiError>;

    /// The buyer's current coin balance, or `None` if the buyer does not exist.
    async fn find_balance(&self, buyer_id: &BuyerId) -> Result<Option<Coins>, BuyerApiError>;
}
