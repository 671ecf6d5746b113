use std::{convert::Infallible, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use fanpush_common::Coins;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------        BuyerId        ---------------------------------------------------------
/// The user id of a buyer. Buyers spend coins on orders, and also act as the "followers" that orders are pushed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct BuyerId(pub String);

impl FromStr for BuyerId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for BuyerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BuyerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for BuyerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl BuyerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    /// A fresh, globally unique order id (hyphenated UUID v4, 36 characters).
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      ScheduleKey      ---------------------------------------------------------
/// The composite ordering key of the schedule.
///
/// Orders are pushed in ascending `due_key` (the creation timestamp) order. Ties are broken by buyer id, and then by
/// order id, so that the key is a strict total order and every order has a unique position.
///
/// A buyer's push checkpoint is also a `ScheduleKey`: the position of the last entry that buyer pushed. The default
/// key, `(0, "", "")`, sorts before every real order and is the checkpoint of a buyer that has never pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleKey {
    pub due_key: i64,
    pub buyer_id: BuyerId,
    pub order_id: OrderId,
}

impl ScheduleKey {
    pub fn new(due_key: i64, buyer_id: BuyerId, order_id: OrderId) -> Self {
        Self { due_key, buyer_id, order_id }
    }

    pub fn origin() -> Self {
        Self::default()
    }
}

impl Display for ScheduleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}/{}]", self.due_key, self.buyer_id, self.order_id.as_str())
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub buyer_id: BuyerId,
    /// Creation time, in seconds since the Unix epoch. This is the order's due key.
    pub created_at: i64,
    pub coins_spent: Coins,
    pub fans_target: i64,
    pub progress: i64,
    pub completed: bool,
}

impl Order {
    pub fn schedule_key(&self) -> ScheduleKey {
        ScheduleKey::new(self.created_at, self.buyer_id.clone(), self.order_id.clone())
    }

    /// Checks that the record satisfies `0 <= progress <= fans_target` and `completed == (progress == fans_target)`.
    pub fn check_invariants(&self) -> Result<(), RecordShapeError> {
        if self.order_id.as_str().trim().is_empty() {
            return Err(RecordShapeError::MissingOrderId);
        }
        if self.buyer_id.is_empty() {
            return Err(RecordShapeError::MissingBuyer(self.order_id.clone()));
        }
        if self.fans_target <= 0 {
            return Err(RecordShapeError::InvalidFanTarget(self.order_id.clone(), self.fans_target));
        }
        if self.progress < 0 || self.progress > self.fans_target {
            return Err(RecordShapeError::ProgressOutOfRange {
                order_id: self.order_id.clone(),
                progress: self.progress,
                fans_target: self.fans_target,
            });
        }
        if self.completed != (self.progress == self.fans_target) {
            return Err(RecordShapeError::CompletionMismatch {
                order_id: self.order_id.clone(),
                completed: self.completed,
                progress: self.progress,
                fans_target: self.fans_target,
            });
        }
        Ok(())
    }

    pub fn progress_view(&self) -> OrderProgress {
        OrderProgress {
            order_id: self.order_id.clone(),
            fans_target: self.fans_target,
            progress: self.progress,
            completed: self.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordShapeError {
    #[error("Order record has an empty order id")]
    MissingOrderId,
    #[error("Order {0} has an empty buyer id")]
    MissingBuyer(OrderId),
    #[error("Order {0} has a non-positive fan target ({1})")]
    InvalidFanTarget(OrderId, i64),
    #[error("Order {order_id} has progress {progress}, which is outside 0..={fans_target}")]
    ProgressOutOfRange { order_id: OrderId, progress: i64, fans_target: i64 },
    #[error("Order {order_id} is marked completed={completed}, but has progress {progress}/{fans_target}")]
    CompletionMismatch { order_id: OrderId, completed: bool, progress: i64, fans_target: i64 },
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub buyer_id: BuyerId,
    pub created_at: i64,
    pub coins_spent: Coins,
    pub fans_target: i64,
}

impl NewOrder {
    /// Creates a new order with a random order id, timestamped now.
    pub fn new(buyer_id: BuyerId, coins_spent: Coins, fans_target: i64) -> Self {
        Self { order_id: OrderId::random(), buyer_id, created_at: Utc::now().timestamp(), coins_spent, fans_target }
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = order_id;
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    /// The order record as it is first persisted: no progress, not completed.
    pub fn into_order(self) -> Order {
        Order {
            order_id: self.order_id,
            buyer_id: self.buyer_id,
            created_at: self.created_at,
            coins_spent: self.coins_spent,
            fans_target: self.fans_target,
            progress: 0,
            completed: false,
        }
    }
}

//--------------------------------------         Buyer         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Buyer {
    pub buyer_id: BuyerId,
    pub coin_balance: Coins,
    pub last_push_date: i64,
    pub last_push_buyer: BuyerId,
    pub last_push_order: OrderId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Buyer {
    /// The position in the schedule up to which this buyer has already pushed.
    pub fn checkpoint(&self) -> ScheduleKey {
        ScheduleKey::new(self.last_push_date, self.last_push_buyer.clone(), self.last_push_order.clone())
    }
}

//--------------------------------------     ProgressUpdate    ---------------------------------------------------------
/// A single order's step within a push batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub key: ScheduleKey,
    /// The progress the order must still have in the store for this update to apply.
    pub previous_progress: i64,
    pub new_progress: i64,
    pub completed: bool,
}

impl ProgressUpdate {
    pub fn order_id(&self) -> &OrderId {
        &self.key.order_id
    }

    pub fn buyer_id(&self) -> &BuyerId {
        &self.key.buyer_id
    }
}

//--------------------------------------       PushBatch       ---------------------------------------------------------
/// Everything a single push writes to the store. It must be applied in full or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushBatch {
    pub requester: BuyerId,
    /// The checkpoint the batch was selected from. The store refuses the batch if the checkpoint has since moved.
    pub previous_checkpoint: ScheduleKey,
    pub new_checkpoint: ScheduleKey,
    pub updates: Vec<ProgressUpdate>,
}

//--------------------------------------     OrderProgress     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProgress {
    pub order_id: OrderId,
    pub fans_target: i64,
    pub progress: i64,
    pub completed: bool,
}
