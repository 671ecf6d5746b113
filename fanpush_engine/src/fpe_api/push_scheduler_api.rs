//! # Push scheduling
//!
//! A push delivers one fan to each of a small batch of due orders. Which orders are due depends on who is pushing:
//! every buyer has a checkpoint, the [`ScheduleKey`] of the last order they pushed, and their next push picks up the
//! orders that sort strictly after it.
//!
//! A push runs in three phases:
//! 1. Read the requester's checkpoint fresh from the store, then select candidates from the [`ScheduleIndex`].
//! 2. Write every progress step plus the new checkpoint to the store as one atomic batch.
//! 3. Only once the store has committed, mirror the batch in the index.
//!
//! The index lock is held during phases 1 and 3 only. Two pushes that select the same order concurrently are resolved
//! by the store: each step is guarded by the progress it was computed from, and the checkpoint by its previous value,
//! so the loser's whole batch is rejected and neither the store nor the index sees any part of it. The loser then
//! catches its candidates up with the store and starts again from phase 1, up to [`MAX_PUSH_ATTEMPTS`] times.
use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{BuyerId, ProgressUpdate, PushBatch, ScheduleKey},
    events::{EventProducers, EventType, OrderCompletedEvent, OrdersAdvancedEvent},
    fpe_api::{errors::SchedulerError, ledger_objects::PushOutcome},
    schedule_index::{ScanFilter, ScheduleIndex},
    traits::{FanPushDatabase, PushGatewayError},
};

pub const DEFAULT_MAX_PUSH_BATCH: usize = 50;
/// How many times a push is attempted when it keeps losing races with other pushes.
pub const MAX_PUSH_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushPolicy {
    /// The largest batch a single push may request.
    pub max_batch: usize,
    /// When set, a buyer's pushes never advance that buyer's own orders.
    pub skip_own_orders: bool,
}

impl Default for PushPolicy {
    fn default() -> Self {
        Self { max_batch: DEFAULT_MAX_PUSH_BATCH, skip_own_orders: false }
    }
}

pub struct PushSchedulerApi<B> {
    db: B,
    index: Arc<ScheduleIndex>,
    policy: PushPolicy,
    producers: EventProducers,
}

impl<B> Debug for PushSchedulerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PushSchedulerApi ({:?})", self.policy)
    }
}

impl<B> PushSchedulerApi<B> {
    pub fn new(db: B, index: Arc<ScheduleIndex>, producers: EventProducers) -> Self {
        Self { db, index, policy: PushPolicy::default(), producers }
    }

    pub fn with_policy(mut self, policy: PushPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PushPolicy {
        self.policy
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PushSchedulerApi<B>
where B: FanPushDatabase
{
    /// Advances up to `max_count` due orders by one fan each, on behalf of `requester`.
    ///
    /// Returns [`SchedulerError::NoCandidates`] if nothing is due after the requester's checkpoint. Losing a race with
    /// a concurrent push is handled here. If the store fails, or the push keeps losing, the result is
    /// [`SchedulerError::StoreOperationFailure`] and nothing has changed, so the same push can simply be retried.
    pub async fn push(&self, requester: &BuyerId, max_count: usize) -> Result<PushOutcome, SchedulerError> {
        if requester.is_empty() {
            return Err(SchedulerError::InvalidParameters("A buyer id is required".into()));
        }
        if max_count == 0 || max_count > self.policy.max_batch {
            return Err(SchedulerError::InvalidParameters(format!(
                "A push must request between 1 and {} orders, not {max_count}",
                self.policy.max_batch
            )));
        }
        let filter =
            if self.policy.skip_own_orders { ScanFilter::ExcludeBuyer(requester.clone()) } else { ScanFilter::Any };
        let mut attempt = 1;
        let batch = loop {
            let batch = self.select_batch(requester, max_count, &filter).await?;
            match self.db.advance_progress(&batch).await {
                Ok(()) => break batch,
                Err(e) if e.is_conflict() && attempt < MAX_PUSH_ATTEMPTS => {
                    debug!("🚀️ Push by {requester} lost a race on attempt {attempt}. Catching up. {e}");
                    self.catch_up(&batch.updates).await?;
                    attempt += 1;
                },
                Err(e) => {
                    warn!("🚀️ Push by {requester} was not applied. The schedule is unchanged. {e}");
                    return Err(store_failure(e));
                },
            }
        };
        let removed = self.index.apply(&batch.updates);

        let PushBatch { new_checkpoint, updates, .. } = batch;
        let buyer_ids = updates.iter().map(|u| u.buyer_id().clone()).collect::<Vec<_>>();
        let completed = updates.iter().filter(|u| u.completed).map(|u| u.key.clone()).collect::<Vec<_>>();
        debug!(
            "🚀️ {requester} advanced {} orders ({removed} completed). Checkpoint is now {new_checkpoint}",
            updates.len()
        );
        self.notify(requester, &buyer_ids, &updates, &new_checkpoint).await;
        Ok(PushOutcome { buyer_ids, updates, completed, checkpoint: new_checkpoint })
    }

    /// Reads the requester's checkpoint fresh from the store and picks the next candidates after it from the index.
    async fn select_batch(
        &self,
        requester: &BuyerId,
        max_count: usize,
        filter: &ScanFilter,
    ) -> Result<PushBatch, SchedulerError> {
        let checkpoint = self
            .db
            .fetch_checkpoint(requester)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| SchedulerError::buyer_not_found(requester))?;
        trace!("🚀️ {requester} is pushing from checkpoint {checkpoint}");

        let candidates = self.index.scan_after(&checkpoint, max_count, filter);
        let Some(last) = candidates.last() else {
            debug!("🚀️ Nothing is due for {requester} after {checkpoint}");
            return Err(SchedulerError::NoCandidates(requester.clone()));
        };
        let new_checkpoint = last.key.clone();
        let updates = candidates
            .iter()
            .map(|entry| {
                let (new_progress, completed) = entry.order.next_step();
                ProgressUpdate { key: entry.key.clone(), previous_progress: entry.order.progress, new_progress, completed }
            })
            .collect::<Vec<_>>();
        Ok(PushBatch { requester: requester.clone(), previous_checkpoint: checkpoint, new_checkpoint, updates })
    }

    /// Brings the index entries of a rejected batch up to date with the store.
    ///
    /// A batch is rejected when another push committed first. That push may never have been mirrored in the index,
    /// e.g. if its request was dropped between the commit and the apply, so the store copy is the only reliable one.
    async fn catch_up(&self, updates: &[ProgressUpdate]) -> Result<(), SchedulerError> {
        for update in updates {
            match self.db.fetch_order_by_order_id(update.order_id()).await? {
                Some(order) => {
                    self.index.refresh(&order);
                },
                None => {
                    warn!("🚀️ Order {} is scheduled but is not in the store. Dropping it.", update.order_id());
                    self.index.remove(&update.key);
                },
            }
        }
        Ok(())
    }

    async fn notify(
        &self,
        requester: &BuyerId,
        buyer_ids: &[BuyerId],
        updates: &[ProgressUpdate],
        checkpoint: &ScheduleKey,
    ) {
        let event = OrdersAdvancedEvent::new(requester.clone(), buyer_ids.to_vec(), checkpoint.clone());
        self.producers.publish(EventType::OrdersAdvanced(event)).await;
        for update in updates.iter().filter(|u| u.completed) {
            info!("🚀️ Order {} for {} is complete", update.order_id(), update.buyer_id());
            let event = OrderCompletedEvent::new(update.key.clone(), update.new_progress);
            self.producers.publish(EventType::OrderCompleted(event)).await;
        }
    }
}

/// Every store error during a push is reported as a store failure, including a requester that vanished mid-push.
fn store_failure(e: PushGatewayError) -> SchedulerError {
    SchedulerError::StoreOperationFailure(e.to_string())
}
