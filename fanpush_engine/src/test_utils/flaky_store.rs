//! A store wrapper that can be told to fail, for exercising the failure paths of pushes and purchases.
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    db_types::{Buyer, BuyerId, Coins, NewOrder, Order, OrderId, PushBatch, ScheduleKey},
    traits::{BuyerApiError, BuyerManagement, FanPushDatabase, PushGatewayError},
};

/// Delegates to `B`, except that batch updates and purchases fail while the matching switch is on. Batch updates can
/// also be made to stall after they have committed.
///
/// Clones share their switches, so a test can keep one clone and hand another to the API under test.
#[derive(Debug, Clone)]
pub struct FlakyDatabase<B> {
    inner: B,
    fail_advance: Arc<AtomicBool>,
    fail_purchase: Arc<AtomicBool>,
    advance_delay_ms: Arc<AtomicU64>,
}

impl<B> FlakyDatabase<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            fail_advance: Arc::default(),
            fail_purchase: Arc::default(),
            advance_delay_ms: Arc::default(),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn fail_advances(&self, fail: bool) {
        self.fail_advance.store(fail, Ordering::SeqCst);
    }

    pub fn fail_purchases(&self, fail: bool) {
        self.fail_purchase.store(fail, Ordering::SeqCst);
    }

    /// Every successful batch update waits this long after committing before it returns.
    pub fn stall_advances(&self, delay: Duration) {
        self.advance_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

impl<B: BuyerManagement> BuyerManagement for FlakyDatabase<B> {
    async fn fetch_buyer(&self, buyer_id: &BuyerId) -> Result<Option<Buyer>, BuyerApiError> {
        self.inner.fetch_buyer(buyer_id).await
    }

    async fn fetch_or_create_buyer(&self, buyer_id: &BuyerId) -> Result<Buyer, BuyerApiError> {
        self.inner.fetch_or_create_buyer(buyer_id).await
    }

    async fn fetch_orders_for_buyer(&self, buyer_id: &BuyerId) -> Result<Vec<Order>, BuyerApiError> {
        self.inner.fetch_orders_for_buyer(buyer_id).await
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, BuyerApiError> {
        self.inner.fetch_order_by_order_id(order_id).await
    }

    async fn find_balance(&self, buyer_id: &BuyerId) -> Result<Option<Coins>, BuyerApiError> {
        self.inner.find_balance(buyer_id).await
    }
}

impl<B: FanPushDatabase> FanPushDatabase for FlakyDatabase<B> {
    async fn credit_buyer(&self, buyer_id: &BuyerId, amount: Coins) -> Result<Buyer, PushGatewayError> {
        self.inner.credit_buyer(buyer_id, amount).await
    }

    async fn debit_and_append_order(&self, order: NewOrder) -> Result<(Order, Coins), PushGatewayError> {
        if self.fail_purchase.load(Ordering::SeqCst) {
            return Err(PushGatewayError::DatabaseError("injected purchase failure".into()));
        }
        self.inner.debit_and_append_order(order).await
    }

    async fn fetch_checkpoint(&self, buyer_id: &BuyerId) -> Result<Option<ScheduleKey>, PushGatewayError> {
        self.inner.fetch_checkpoint(buyer_id).await
    }

    async fn advance_progress(&self, batch: &PushBatch) -> Result<(), PushGatewayError> {
        if self.fail_advance.load(Ordering::SeqCst) {
            return Err(PushGatewayError::DatabaseError("injected batch failure".into()));
        }
        self.inner.advance_progress(batch).await?;
        let delay = self.advance_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(())
    }

    async fn fetch_incomplete_orders(&self) -> Result<Vec<Order>, PushGatewayError> {
        self.inner.fetch_incomplete_orders().await
    }
}
