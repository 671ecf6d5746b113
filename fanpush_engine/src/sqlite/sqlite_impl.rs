//! `SqliteDatabase` is the concrete store behind the fan push engine.
//!
//! It implements both [`BuyerManagement`] and [`FanPushDatabase`]. Every multi-row write happens inside a single
//! transaction, so a failed purchase or push leaves no partial trace in the database.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{buyers, db_url, new_pool, orders, orders::OrderQueryFilter};
use crate::{
    db_types::{Buyer, BuyerId, Coins, NewOrder, Order, OrderId, PushBatch, ScheduleKey},
    traits::{BuyerApiError, BuyerManagement, FanPushDatabase, PushGatewayError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl BuyerManagement for SqliteDatabase {
    async fn fetch_buyer(&self, buyer_id: &BuyerId) -> Result<Option<Buyer>, BuyerApiError> {
        let mut conn = self.pool.acquire().await?;
        buyers::fetch_buyer(buyer_id, &mut conn).await
    }

    async fn fetch_or_create_buyer(&self, buyer_id: &BuyerId) -> Result<Buyer, BuyerApiError> {
        let mut tx = self.pool.begin().await?;
        buyers::create_buyer_if_absent(buyer_id, &mut tx).await?;
        let buyer = buyers::fetch_buyer(buyer_id, &mut tx)
            .await?
            .ok_or_else(|| BuyerApiError::DatabaseError(format!("Buyer {buyer_id} vanished after being created")))?;
        tx.commit().await?;
        Ok(buyer)
    }

    async fn fetch_orders_for_buyer(&self, buyer_id: &BuyerId) -> Result<Vec<Order>, BuyerApiError> {
        let mut conn = self.pool.acquire().await?;
        let query = OrderQueryFilter::default().with_buyer_id(buyer_id.clone());
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, BuyerApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn find_balance(&self, buyer_id: &BuyerId) -> Result<Option<Coins>, BuyerApiError> {
        let mut conn = self.pool.acquire().await?;
        buyers::fetch_balance(buyer_id, &mut conn).await
    }
}

impl FanPushDatabase for SqliteDatabase {
    async fn credit_buyer(&self, buyer_id: &BuyerId, amount: Coins) -> Result<Buyer, PushGatewayError> {
        let mut conn = self.pool.acquire().await?;
        buyers::credit(buyer_id, amount, &mut conn).await
    }

    async fn debit_and_append_order(&self, order: NewOrder) -> Result<(Order, Coins), PushGatewayError> {
        let mut tx = self.pool.begin().await?;
        let buyer_id = order.buyer_id.clone();
        let requested = order.coins_spent;
        let balance = match buyers::try_debit(&buyer_id, requested, &mut tx).await? {
            Some(balance) => balance,
            None => {
                // Dropping the transaction rolls it back. Nothing was written anyway.
                let available = buyers::fetch_balance(&buyer_id, &mut tx).await?;
                return match available {
                    Some(available) => Err(PushGatewayError::InsufficientFunds { buyer_id, requested, available }),
                    None => Err(PushGatewayError::BuyerNotFound(buyer_id)),
                };
            },
        };
        let order = order.into_order();
        orders::insert_order(&order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {buyer_id} spent {requested} on order {}. Remaining balance: {balance}", order.order_id);
        Ok((order, balance))
    }

    async fn fetch_checkpoint(&self, buyer_id: &BuyerId) -> Result<Option<ScheduleKey>, PushGatewayError> {
        let mut conn = self.pool.acquire().await?;
        buyers::fetch_checkpoint(buyer_id, &mut conn).await
    }

    async fn advance_progress(&self, batch: &PushBatch) -> Result<(), PushGatewayError> {
        let mut tx = self.pool.begin().await?;
        let requester = &batch.requester;
        if !buyers::move_checkpoint(requester, &batch.previous_checkpoint, &batch.new_checkpoint, &mut tx).await? {
            debug!("🗃️ Checkpoint for {requester} is no longer {}. Rolling back.", batch.previous_checkpoint);
            return Err(PushGatewayError::CheckpointMoved(requester.clone()));
        }
        for update in &batch.updates {
            if !orders::advance_order(update, &mut tx).await? {
                debug!("🗃️ Order {} is no longer at progress {}. Rolling back.", update.order_id(), update.previous_progress);
                return Err(PushGatewayError::StaleProgress(update.order_id().clone()));
            }
        }
        tx.commit().await?;
        trace!(
            "🗃️ Push by {requester} advanced {} orders. Checkpoint moved to {}",
            batch.updates.len(),
            batch.new_checkpoint
        );
        Ok(())
    }

    async fn fetch_incomplete_orders(&self) -> Result<Vec<Order>, PushGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let query = OrderQueryFilter::default().with_completed(false);
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn close(&mut self) -> Result<(), PushGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `FPS_DATABASE_URL` or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }
}
