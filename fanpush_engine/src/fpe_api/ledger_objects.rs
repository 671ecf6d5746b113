use serde::{Deserialize, Serialize};

use crate::db_types::{BuyerId, Coins, Order, OrderProgress, ProgressUpdate, ScheduleKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub order: Order,
    /// The buyer's balance after paying for the order.
    pub balance: Coins,
}

/// What a successful push did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOutcome {
    /// The owner of every advanced order, in batch order. A buyer with several advanced orders appears several times.
    pub buyer_ids: Vec<BuyerId>,
    pub updates: Vec<ProgressUpdate>,
    /// Orders that reached their fan target in this push.
    pub completed: Vec<ScheduleKey>,
    /// The requester's checkpoint after the push.
    pub checkpoint: ScheduleKey,
}

impl PushOutcome {
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerInfo {
    pub buyer_id: BuyerId,
    pub coin_balance: Coins,
    pub orders: Vec<OrderProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerProgress {
    pub buyer_id: BuyerId,
    pub orders: Vec<OrderProgress>,
}

impl BuyerProgress {
    pub fn pending(&self) -> impl Iterator<Item = &OrderProgress> {
        self.orders.iter().filter(|o| !o.completed)
    }
}
