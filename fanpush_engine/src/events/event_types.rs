use serde::{Deserialize, Serialize};

use crate::db_types::{BuyerId, Coins, Order, ScheduleKey};

/// A purchase has been committed. The order is in the store and in the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPurchasedEvent {
    pub order: Order,
    pub remaining_balance: Coins,
}

impl OrderPurchasedEvent {
    pub fn new(order: Order, remaining_balance: Coins) -> Self {
        Self { order, remaining_balance }
    }
}

/// A push has been committed and applied to the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersAdvancedEvent {
    pub requester: BuyerId,
    /// The owners of the advanced orders, in batch order. A buyer appears once per advanced order.
    pub buyer_ids: Vec<BuyerId>,
    pub checkpoint: ScheduleKey,
}

impl OrdersAdvancedEvent {
    pub fn new(requester: BuyerId, buyer_ids: Vec<BuyerId>, checkpoint: ScheduleKey) -> Self {
        Self { requester, buyer_ids, checkpoint }
    }
}

/// An order has reached its fan target and left the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompletedEvent {
    pub key: ScheduleKey,
    pub fans_target: i64,
}

impl OrderCompletedEvent {
    pub fn new(key: ScheduleKey, fans_target: i64) -> Self {
        Self { key, fans_target }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPurchased(OrderPurchasedEvent),
    OrdersAdvanced(OrdersAdvancedEvent),
    OrderCompleted(OrderCompletedEvent),
}
