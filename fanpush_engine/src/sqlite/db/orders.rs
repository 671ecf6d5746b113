use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{BuyerId, Order, OrderId, ProgressUpdate},
    traits::PushGatewayError,
};

/// Criteria for [`search_orders`]. Empty criteria match every order.
#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<BuyerId>,
    pub completed: Option<bool>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: BuyerId) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() && self.completed.is_none()
    }
}

/// Inserts a new order using the given connection. This is not atomic on its own. Embed this call inside a transaction
/// if it must happen together with other writes.
pub async fn insert_order(order: &Order, conn: &mut SqliteConnection) -> Result<(), PushGatewayError> {
    let result = sqlx::query(
        r#"
            INSERT INTO orders (order_id, buyer_id, created_at, coins_spent, fans_target, progress, completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.buyer_id.as_str())
    .bind(order.created_at)
    .bind(order.coins_spent.value())
    .bind(order.fans_target)
    .bind(order.progress)
    .bind(order.completed)
    .execute(conn)
    .await;
    match result {
        Ok(_) => {
            debug!("📝️ Order {} for {} saved", order.order_id, order.buyer_id);
            Ok(())
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(PushGatewayError::OrderAlreadyExists(order.order_id.clone()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are returned in schedule order: by `created_at`, then buyer id, then order id.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id.0);
    }
    if let Some(completed) = query.completed {
        where_clause.push("completed = ");
        where_clause.push_bind_unseparated(completed);
    }
    builder.push(" ORDER BY created_at ASC, buyer_id ASC, order_id ASC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {} orders", orders.len());
    Ok(orders)
}

/// Sets the order's progress, but only if it still has `update.previous_progress` and is not complete yet.
/// Returns `false` if the guard did not match.
pub async fn advance_order(update: &ProgressUpdate, conn: &mut SqliteConnection) -> Result<bool, PushGatewayError> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET progress = $1, completed = $2, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $3 AND progress = $4 AND completed = FALSE
        "#,
    )
    .bind(update.new_progress)
    .bind(update.completed)
    .bind(update.order_id().as_str())
    .bind(update.previous_progress)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
