use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Buyer, BuyerId, Coins, ScheduleKey},
    traits::{BuyerApiError, PushGatewayError},
};

pub async fn fetch_buyer(buyer_id: &BuyerId, conn: &mut SqliteConnection) -> Result<Option<Buyer>, BuyerApiError> {
    let buyer = sqlx::query_as("SELECT * FROM buyers WHERE buyer_id = $1")
        .bind(buyer_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(buyer)
}

/// Inserts a zero-balance buyer with the origin checkpoint. Does nothing if the buyer already exists.
/// Returns `true` if a new record was created.
pub async fn create_buyer_if_absent(buyer_id: &BuyerId, conn: &mut SqliteConnection) -> Result<bool, BuyerApiError> {
    let result = sqlx::query("INSERT INTO buyers (buyer_id) VALUES ($1) ON CONFLICT (buyer_id) DO NOTHING")
        .bind(buyer_id.as_str())
        .execute(conn)
        .await?;
    let created = result.rows_affected() > 0;
    if created {
        debug!("🧑️ Created buyer record for {buyer_id}");
    }
    Ok(created)
}

pub async fn fetch_balance(buyer_id: &BuyerId, conn: &mut SqliteConnection) -> Result<Option<Coins>, BuyerApiError> {
    let balance: Option<(Coins,)> = sqlx::query_as("SELECT coin_balance FROM buyers WHERE buyer_id = $1")
        .bind(buyer_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(balance.map(|(b,)| b))
}

/// Adds `amount` to the buyer's balance, creating the buyer if necessary, and returns the updated record.
pub async fn credit(buyer_id: &BuyerId, amount: Coins, conn: &mut SqliteConnection) -> Result<Buyer, PushGatewayError> {
    let buyer: Buyer = sqlx::query_as(
        r#"
            INSERT INTO buyers (buyer_id, coin_balance) VALUES ($1, $2)
            ON CONFLICT (buyer_id) DO UPDATE SET
                coin_balance = coin_balance + excluded.coin_balance,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(buyer_id.as_str())
    .bind(amount.value())
    .fetch_one(conn)
    .await?;
    trace!("🧑️ Credited {amount} to {buyer_id}. Balance is now {}", buyer.coin_balance);
    Ok(buyer)
}

/// Debits `amount` from the buyer if, and only if, the balance covers it. The balance check and the debit are a single
/// statement, so two concurrent debits can never both succeed against the same coins.
///
/// Returns the remaining balance, or `None` if the buyer does not exist or cannot afford the debit.
pub async fn try_debit(
    buyer_id: &BuyerId,
    amount: Coins,
    conn: &mut SqliteConnection,
) -> Result<Option<Coins>, PushGatewayError> {
    let balance: Option<(Coins,)> = sqlx::query_as(
        r#"
            UPDATE buyers SET coin_balance = coin_balance - $1, updated_at = CURRENT_TIMESTAMP
            WHERE buyer_id = $2 AND coin_balance >= $3
            RETURNING coin_balance;
        "#,
    )
    .bind(amount.value())
    .bind(buyer_id.as_str())
    .bind(amount.value())
    .fetch_optional(conn)
    .await?;
    Ok(balance.map(|(b,)| b))
}

pub async fn fetch_checkpoint(
    buyer_id: &BuyerId,
    conn: &mut SqliteConnection,
) -> Result<Option<ScheduleKey>, PushGatewayError> {
    let row: Option<(i64, String, String)> =
        sqlx::query_as("SELECT last_push_date, last_push_buyer, last_push_order FROM buyers WHERE buyer_id = $1")
            .bind(buyer_id.as_str())
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(date, buyer, order)| ScheduleKey::new(date, buyer.into(), order.into())))
}

/// Moves the buyer's checkpoint from `previous` to `next`. The update only applies if the stored checkpoint still equals
/// `previous`. Returns `false` if it did not.
pub async fn move_checkpoint(
    buyer_id: &BuyerId,
    previous: &ScheduleKey,
    next: &ScheduleKey,
    conn: &mut SqliteConnection,
) -> Result<bool, PushGatewayError> {
    let result = sqlx::query(
        r#"
            UPDATE buyers SET
                last_push_date = $1,
                last_push_buyer = $2,
                last_push_order = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE buyer_id = $4 AND last_push_date = $5 AND last_push_buyer = $6 AND last_push_order = $7
        "#,
    )
    .bind(next.due_key)
    .bind(next.buyer_id.as_str())
    .bind(next.order_id.as_str())
    .bind(buyer_id.as_str())
    .bind(previous.due_key)
    .bind(previous.buyer_id.as_str())
    .bind(previous.order_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
