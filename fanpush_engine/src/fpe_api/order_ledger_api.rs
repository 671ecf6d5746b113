use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{Buyer, BuyerId, Coins, NewOrder},
    events::{EventProducers, EventType, OrderPurchasedEvent},
    fpe_api::{errors::SchedulerError, ledger_objects::PurchaseResult},
    schedule_index::ScheduleIndex,
    traits::FanPushDatabase,
};

/// `OrderLedgerApi` handles the money side of the service: coin top-ups, and spending coins on new orders.
///
/// A purchase is only added to the schedule once the store has committed both the debit and the new order.
pub struct OrderLedgerApi<B> {
    db: B,
    index: Arc<ScheduleIndex>,
    producers: EventProducers,
}

impl<B> Debug for OrderLedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderLedgerApi ({} scheduled)", self.index.len())
    }
}

impl<B> OrderLedgerApi<B> {
    pub fn new(db: B, index: Arc<ScheduleIndex>, producers: EventProducers) -> Self {
        Self { db, index, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderLedgerApi<B>
where B: FanPushDatabase
{
    /// Spends `coins` of the buyer's balance on a new order for `fans_target` fans.
    ///
    /// The order gets a fresh id and the current time as its due key.
    pub async fn purchase(
        &self,
        buyer_id: &BuyerId,
        coins: Coins,
        fans_target: i64,
    ) -> Result<PurchaseResult, SchedulerError> {
        let order = NewOrder::new(buyer_id.clone(), coins, fans_target);
        self.place_order(order).await
    }

    /// Like [`Self::purchase`], but the caller supplies the order id and timestamp.
    pub async fn place_order(&self, order: NewOrder) -> Result<PurchaseResult, SchedulerError> {
        validate_new_order(&order)?;
        let buyer_id = order.buyer_id.clone();
        let (order, balance) = self.db.debit_and_append_order(order).await.map_err(|e| {
            debug!("💸️ Purchase for {buyer_id} was rejected. {e}");
            SchedulerError::from(e)
        })?;
        if !self.index.insert(&order) {
            warn!("💸️ Order {} was already in the schedule when it was purchased", order.order_id);
        }
        info!(
            "💸️ {buyer_id} bought {} fans for {} in order {}. Remaining balance: {balance}",
            order.fans_target, order.coins_spent, order.order_id
        );
        let event = OrderPurchasedEvent::new(order.clone(), balance);
        self.producers.publish(EventType::OrderPurchased(event)).await;
        Ok(PurchaseResult { order, balance })
    }

    /// Tops up the buyer's coin balance, creating the buyer if this is the first time we have seen them.
    pub async fn credit(&self, buyer_id: &BuyerId, coins: Coins) -> Result<Buyer, SchedulerError> {
        if buyer_id.is_empty() {
            return Err(SchedulerError::InvalidParameters("A buyer id is required".into()));
        }
        if !coins.is_positive() {
            return Err(SchedulerError::InvalidParameters(format!("Cannot credit {coins}. The amount must be positive")));
        }
        let buyer = self.db.credit_buyer(buyer_id, coins).await?;
        info!("💸️ {buyer_id} was credited with {coins}. Balance is now {}", buyer.coin_balance);
        Ok(buyer)
    }

    pub async fn balance(&self, buyer_id: &BuyerId) -> Result<Coins, SchedulerError> {
        self.db.find_balance(buyer_id).await?.ok_or_else(|| SchedulerError::buyer_not_found(buyer_id))
    }
}

fn validate_new_order(order: &NewOrder) -> Result<(), SchedulerError> {
    if order.buyer_id.is_empty() {
        return Err(SchedulerError::InvalidParameters("A buyer id is required".into()));
    }
    if order.order_id.as_str().trim().is_empty() {
        return Err(SchedulerError::InvalidParameters("An order id is required".into()));
    }
    if !order.coins_spent.is_positive() {
        return Err(SchedulerError::InvalidParameters(format!(
            "Cannot spend {} on an order. The amount must be positive",
            order.coins_spent
        )));
    }
    if order.fans_target <= 0 {
        return Err(SchedulerError::InvalidParameters(format!(
            "An order must be for at least one fan, not {}",
            order.fans_target
        )));
    }
    Ok(())
}
