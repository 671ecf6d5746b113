use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Buyer, BuyerId, Order, OrderId, OrderProgress},
    fpe_api::{
        errors::SchedulerError,
        ledger_objects::{BuyerInfo, BuyerProgress},
    },
    traits::BuyerManagement,
};

/// Read-only views of buyers and their orders. Nothing here touches the schedule.
pub struct BuyerApi<B> {
    db: B,
    lazy_create: bool,
}

impl<B> Debug for BuyerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BuyerApi (lazy_create: {})", self.lazy_create)
    }
}

impl<B> BuyerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, lazy_create: false }
    }

    /// When enabled, querying an unknown buyer creates a zero-balance record for them instead of failing.
    pub fn with_lazy_create(mut self, lazy_create: bool) -> Self {
        self.lazy_create = lazy_create;
        self
    }
}

impl<B> BuyerApi<B>
where B: BuyerManagement
{
    pub async fn info(&self, buyer_id: &BuyerId) -> Result<BuyerInfo, SchedulerError> {
        let buyer = self.resolve_buyer(buyer_id).await?;
        let orders = self.db.fetch_orders_for_buyer(buyer_id).await?;
        Ok(BuyerInfo { buyer_id: buyer.buyer_id, coin_balance: buyer.coin_balance, orders: progress_of(&orders) })
    }

    pub async fn progress(&self, buyer_id: &BuyerId) -> Result<BuyerProgress, SchedulerError> {
        let buyer = self.resolve_buyer(buyer_id).await?;
        let orders = self.db.fetch_orders_for_buyer(buyer_id).await?;
        Ok(BuyerProgress { buyer_id: buyer.buyer_id, orders: progress_of(&orders) })
    }

    pub async fn order(&self, buyer_id: &BuyerId, order_id: &OrderId) -> Result<Order, SchedulerError> {
        match self.db.fetch_order_by_order_id(order_id).await? {
            Some(order) if &order.buyer_id == buyer_id => Ok(order),
            _ => Err(SchedulerError::NotFound(format!("Buyer {buyer_id} has no order {order_id}"))),
        }
    }

    async fn resolve_buyer(&self, buyer_id: &BuyerId) -> Result<Buyer, SchedulerError> {
        if buyer_id.is_empty() {
            return Err(SchedulerError::InvalidParameters("A buyer id is required".into()));
        }
        if self.lazy_create {
            return Ok(self.db.fetch_or_create_buyer(buyer_id).await?);
        }
        self.db.fetch_buyer(buyer_id).await?.ok_or_else(|| {
            debug!("🧑️ No buyer record for {buyer_id}");
            SchedulerError::buyer_not_found(buyer_id)
        })
    }
}

fn progress_of(orders: &[Order]) -> Vec<OrderProgress> {
    orders.iter().map(Order::progress_view).collect()
}
