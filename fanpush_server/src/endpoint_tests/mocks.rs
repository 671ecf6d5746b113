use fanpush_engine::{
    db_types::{Buyer, BuyerId, Coins, NewOrder, Order, OrderId, PushBatch, ScheduleKey},
    traits::{BuyerApiError, BuyerManagement, FanPushDatabase, PushGatewayError},
};
use mockall::mock;

mock! {
    pub FanPushStore {}
    impl BuyerManagement for FanPushStore {
        async fn fetch_buyer(&self, buyer_id: &BuyerId) -> Result<Option<Buyer>, BuyerApiError>;
        async fn fetch_or_create_buyer(&self, buyer_id: &BuyerId) -> Result<Buyer, BuyerApiError>;
        async fn fetch_orders_for_buyer(&self, buyer_id: &BuyerId) -> Result<Vec<Order>, BuyerApiError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, BuyerApiError>;
        async fn find_balance(&self, buyer_id: &BuyerId) -> Result<Option<Coins>, BuyerApiError>;
    }
    impl FanPushDatabase for FanPushStore {
        async fn credit_buyer(&self, buyer_id: &BuyerId, amount: Coins) -> Result<Buyer, PushGatewayError>;
        async fn debit_and_append_order(&self, order: NewOrder) -> Result<(Order, Coins), PushGatewayError>;
        async fn fetch_checkpoint(&self, buyer_id: &BuyerId) -> Result<Option<ScheduleKey>, PushGatewayError>;
        async fn advance_progress(&self, batch: &PushBatch) -> Result<(), PushGatewayError>;
        async fn fetch_incomplete_orders(&self) -> Result<Vec<Order>, PushGatewayError>;
        async fn close(&mut self) -> Result<(), PushGatewayError>;
    }
}

pub fn buyer(id: &str, balance: i64) -> Buyer {
    Buyer {
        buyer_id: id.into(),
        coin_balance: Coins::from(balance),
        last_push_date: 0,
        last_push_buyer: BuyerId::default(),
        last_push_order: OrderId::default(),
        created_at: Default::default(),
        updated_at: Default::default(),
    }
}

pub fn order(buyer_id: &str, order_id: &str, created_at: i64, progress: i64, fans_target: i64) -> Order {
    Order {
        order_id: order_id.into(),
        buyer_id: buyer_id.into(),
        created_at,
        coins_spent: Coins::from(10),
        fans_target,
        progress,
        completed: progress == fans_target,
    }
}
