use std::sync::Arc;

use log::*;

use crate::{fpe_api::errors::BootstrapError, schedule_index::ScheduleIndex, traits::FanPushDatabase};

/// Rebuilds the schedule from the store at startup.
///
/// `load` must finish before the first push is served. An index that failed to load would be indistinguishable from
/// one with nothing due, so every failure here is fatal to the caller.
pub struct Bootstrapper<B> {
    db: B,
    index: Arc<ScheduleIndex>,
}

impl<B> Bootstrapper<B>
where B: FanPushDatabase
{
    pub fn new(db: B, index: Arc<ScheduleIndex>) -> Self {
        Self { db, index }
    }

    /// Loads every incomplete order into the schedule and returns the number of entries added.
    ///
    /// All records are validated before any of them are indexed, so a bad record leaves the index untouched.
    pub async fn load(&self) -> Result<usize, BootstrapError> {
        info!("🥾️ Loading pending orders from the store");
        let orders = self.db.fetch_incomplete_orders().await.map_err(|e| {
            error!("🥾️ Could not read pending orders. {e}");
            BootstrapError::StoreUnavailable(e.to_string())
        })?;
        for order in &orders {
            order.check_invariants().map_err(|e| {
                error!("🥾️ {e}");
                e
            })?;
        }
        let loaded = orders.iter().filter(|order| self.index.insert(order)).count();
        if loaded < orders.len() {
            warn!("🥾️ {} pending orders were already scheduled", orders.len() - loaded);
        }
        info!("🥾️ {loaded} pending orders scheduled");
        Ok(loaded)
    }
}
