use thiserror::Error;

use crate::{
    db_types::{Buyer, BuyerId, Coins, NewOrder, Order, OrderId, PushBatch, ScheduleKey},
    traits::{BuyerApiError, BuyerManagement},
};

/// This trait defines the mutation contract for backends supporting the fan push engine.
///
/// This behaviour includes:
/// * Crediting coins to buyers.
/// * Purchasing orders: debiting a buyer and appending the order in one atomic step.
/// * Reading a buyer's push checkpoint.
/// * Applying a push batch (order progress plus checkpoint) as a single all-or-nothing update.
/// * Loading every incomplete order, so that the in-memory schedule can be rebuilt at startup.
#[allow(async_fn_in_trait)]
pub trait FanPushDatabase: BuyerManagement {
    /// Adds `amount` to the buyer's balance. If the buyer does not exist, one is created with `amount` as its
    /// opening balance. Returns the updated buyer record.
    async fn credit_buyer(&self, buyer_id: &BuyerId, amount: Coins) -> Result<Buyer, PushGatewayError>;

    /// In a single atomic transaction,
    /// * debits `order.coins_spent` from the buyer, if and only if the balance covers it,
    /// * stores the order with zero progress.
    ///
    /// Either both happen or neither does. Returns the stored order and the buyer's remaining balance.
    ///
    /// Fails with [`PushGatewayError::InsufficientFunds`] if the balance is too low and
    /// [`PushGatewayError::BuyerNotFound`] if the buyer does not exist.
    async fn debit_and_append_order(&self, order: NewOrder) -> Result<(Order, Coins), PushGatewayError>;

    /// Reads the buyer's push checkpoint directly from the store. Returns `None` if the buyer does not exist.
    async fn fetch_checkpoint(&self, buyer_id: &BuyerId) -> Result<Option<ScheduleKey>, PushGatewayError>;

    /// Applies a push batch atomically.
    ///
    /// Every progress update only applies if the order still has its expected previous progress, and the checkpoint
    /// only moves if it still equals `batch.previous_checkpoint`. If any of these guards fail, or anything else goes
    /// wrong, nothing in the batch is applied.
    async fn advance_progress(&self, batch: &PushBatch) -> Result<(), PushGatewayError>;

    /// Every order with `completed == false`, in schedule order.
    async fn fetch_incomplete_orders(&self) -> Result<Vec<Order>, PushGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PushGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PushGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Buyer {buyer_id} cannot spend {requested}; the balance is only {available}")]
    InsufficientFunds { buyer_id: BuyerId, requested: Coins, available: Coins },
    #[error("The requested buyer {0} does not exist")]
    BuyerNotFound(BuyerId),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("Order {0} no longer has the progress this push was based on")]
    StaleProgress(OrderId),
    #[error("The push checkpoint of buyer {0} moved while the push was in flight")]
    CheckpointMoved(BuyerId),
    #[error("{0}")]
    BuyerError(#[from] BuyerApiError),
}

impl PushGatewayError {
    /// True if the batch lost a race with another push, as opposed to the store itself failing.
    pub fn is_conflict(&self) -> bool {
        matches!(self, PushGatewayError::StaleProgress(_) | PushGatewayError::CheckpointMoved(_))
    }
}

impl From<sqlx::Error> for PushGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PushGatewayError::DatabaseError(e.to_string())
    }
}
