//! The in-memory schedule of orders that still need fans delivered.
//!
//! [`ScheduleIndex`] is a sorted map from [`ScheduleKey`] to the cached progress of every incomplete order. The store
//! remains the source of truth: the index is only ever changed to match something the store has already committed,
//! so it may lag behind the store but never runs ahead of it.
//!
//! Every operation takes the one lock over the whole map. Callers must never hold it across a store round trip, which
//! is why the API hands out owned snapshots ([`IndexEntry`]) instead of guards.
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use log::*;

use crate::db_types::{BuyerId, Order, ProgressUpdate, ScheduleKey};

/// The cached state of one pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOrder {
    pub progress: i64,
    pub fans_target: i64,
}

impl PendingOrder {
    /// The progress this order will have after one more fan is delivered, and whether that completes it.
    pub fn next_step(&self) -> (i64, bool) {
        let next = (self.progress + 1).min(self.fans_target);
        (next, next == self.fans_target)
    }
}

/// A snapshot of an index entry, taken under the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: ScheduleKey,
    pub order: PendingOrder,
}

/// Restricts which entries a scan may return. Skipped entries do not count towards the scan limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScanFilter {
    #[default]
    Any,
    ExcludeBuyer(BuyerId),
}

impl ScanFilter {
    fn admits(&self, key: &ScheduleKey) -> bool {
        match self {
            ScanFilter::Any => true,
            ScanFilter::ExcludeBuyer(buyer_id) => &key.buyer_id != buyer_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScheduleIndex {
    entries: Mutex<BTreeMap<ScheduleKey, PendingOrder>>,
}

impl ScheduleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ScheduleKey, PendingOrder>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds the order to the schedule if no entry with the same key exists yet.
    ///
    /// An existing entry is never overwritten, and completed orders are never indexed. Returns `true` if the order was
    /// added.
    pub fn insert(&self, order: &Order) -> bool {
        if order.completed {
            trace!("🗓️ Order {} is already complete. Not scheduling it.", order.order_id);
            return false;
        }
        let key = order.schedule_key();
        let mut entries = self.lock();
        if entries.contains_key(&key) {
            trace!("🗓️ {key} is already scheduled");
            return false;
        }
        entries.insert(key, PendingOrder { progress: order.progress, fans_target: order.fans_target });
        true
    }

    /// Returns up to `limit` entries that sort strictly after `cursor`, in ascending key order.
    ///
    /// Passing a buyer's checkpoint as the cursor yields the entries due for that buyer's next push. The checkpoint
    /// entry itself is never returned.
    pub fn scan_after(&self, cursor: &ScheduleKey, limit: usize, filter: &ScanFilter) -> Vec<IndexEntry> {
        let entries = self.lock();
        entries
            .range(cursor..)
            .filter(|(key, _)| *key != cursor && filter.admits(key))
            .take(limit)
            .map(|(key, order)| IndexEntry { key: key.clone(), order: *order })
            .collect()
    }

    /// Removes the entry with the given key. Removing an absent entry is a no-op. Returns `true` if an entry was
    /// removed.
    pub fn remove(&self, key: &ScheduleKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Mirrors a committed push batch: advanced orders take their new progress, and completed orders leave the
    /// schedule. All updates are applied under a single lock acquisition. Returns the number of entries removed.
    pub fn apply(&self, updates: &[ProgressUpdate]) -> usize {
        let mut entries = self.lock();
        let mut removed = 0;
        for update in updates {
            if update.completed {
                if entries.remove(&update.key).is_some() {
                    removed += 1;
                }
                continue;
            }
            match entries.get_mut(&update.key) {
                Some(order) => order.progress = order.progress.max(update.new_progress),
                None => warn!("🗓️ Committed update for {} has no schedule entry", update.key),
            }
        }
        removed
    }

    /// Catches an entry up with the store's copy of the order, after the index was found to lag behind.
    ///
    /// Progress only moves forward, and a completed order leaves the schedule. Orders with no entry are left alone.
    /// Returns `true` if the entry changed.
    pub fn refresh(&self, order: &Order) -> bool {
        let key = order.schedule_key();
        let mut entries = self.lock();
        if order.completed {
            return entries.remove(&key).is_some();
        }
        match entries.get_mut(&key) {
            Some(entry) if entry.progress < order.progress => {
                trace!("🗓️ {key} caught up from {} to {}", entry.progress, order.progress);
                entry.progress = order.progress;
                true
            },
            _ => false,
        }
    }

    pub fn get(&self, key: &ScheduleKey) -> Option<PendingOrder> {
        self.lock().get(key).copied()
    }

    pub fn contains(&self, key: &ScheduleKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Every key in the schedule, in order.
    pub fn keys(&self) -> Vec<ScheduleKey> {
        self.lock().keys().cloned().collect()
    }
}
