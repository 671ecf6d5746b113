use cucumber::{then, when};
use fanpush_engine::{
    db_types::{BuyerId, Coins, NewOrder, Order, OrderId, ScheduleKey},
    traits::{BuyerManagement, FanPushDatabase},
};

use crate::cucumber::PushWorld;

fn parse_list(list: &str) -> Vec<String> {
    list.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

async fn stored_order(world: &PushWorld, order_id: &str) -> Order {
    let db = &world.system().db;
    db.fetch_order_by_order_id(&OrderId::from(order_id)).await.expect("Error fetching order").expect("Order not found")
}

#[when(expr = "buyer '{word}' buys {int} fans for {int} coins")]
async fn buy_fans(world: &mut PushWorld, buyer_id: String, fans: i64, coins: i64) {
    let buyer = BuyerId::from(buyer_id);
    let result = world.system().ledger.purchase(&buyer, Coins::from(coins), fans).await;
    world.last_purchase = Some(result);
}

#[when(expr = "buyer '{word}' places order {word} for {int} fans at time {int}")]
async fn place_order(world: &mut PushWorld, buyer_id: String, order_id: String, fans: i64, created_at: i64) {
    let order = NewOrder::new(BuyerId::from(buyer_id), Coins::from(1), fans)
        .with_order_id(OrderId::from(order_id))
        .with_created_at(created_at);
    let result = world.system().ledger.place_order(order).await;
    world.last_purchase = Some(result);
}

#[when(expr = "buyer '{word}' pushes {int} orders")]
async fn push(world: &mut PushWorld, buyer_id: String, count: usize) {
    let buyer = BuyerId::from(buyer_id);
    let result = world.system().scheduler.push(&buyer, count).await;
    world.last_push = Some(result);
}

#[when("the store rejects batch updates")]
async fn store_fails(world: &mut PushWorld) {
    world.system().db.fail_advances(true);
}

#[when("the store recovers")]
async fn store_recovers(world: &mut PushWorld) {
    world.system().db.fail_advances(false);
}

#[then("the purchase succeeds")]
async fn purchase_succeeds(world: &mut PushWorld) {
    let result = world.last_purchase.as_ref().expect("No purchase was made");
    assert!(result.is_ok(), "Purchase failed: {result:?}");
}

#[then(expr = "the purchase is rejected with {word}")]
async fn purchase_rejected(world: &mut PushWorld, code: String) {
    match world.last_purchase.as_ref().expect("No purchase was made") {
        Ok(result) => panic!("Purchase succeeded: {result:?}"),
        Err(e) => assert_eq!(e.kind().code(), code),
    }
}

#[then(expr = "the new order is for {int} fans with progress {int}")]
async fn new_order_progress(world: &mut PushWorld, fans: i64, progress: i64) {
    let result = world.last_purchase.as_ref().expect("No purchase was made").as_ref().expect("Purchase failed");
    assert_eq!(result.order.fans_target, fans);
    assert_eq!(result.order.progress, progress);
    assert!(!result.order.completed);
}

#[then("the new order is scheduled")]
async fn new_order_scheduled(world: &mut PushWorld) {
    let result = world.last_purchase.as_ref().expect("No purchase was made").as_ref().expect("Purchase failed");
    assert!(world.system().index.contains(&result.order.schedule_key()));
}

#[then(expr = "buyer '{word}' has {int} coins")]
async fn check_balance(world: &mut PushWorld, buyer_id: String, coins: i64) {
    let balance = world.system().db.find_balance(&BuyerId::from(buyer_id)).await.expect("Error fetching balance");
    assert_eq!(balance, Some(Coins::from(coins)));
}

#[then(expr = "buyer '{word}' has {int} orders")]
async fn check_order_count(world: &mut PushWorld, buyer_id: String, count: usize) {
    let orders =
        world.system().db.fetch_orders_for_buyer(&BuyerId::from(buyer_id)).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "the push advanced orders {string}")]
async fn check_pushed_orders(world: &mut PushWorld, orders: String) {
    let expected = parse_list(&orders);
    let advanced = world.pushed().updates.iter().map(|u| u.order_id().as_str().to_string()).collect::<Vec<_>>();
    assert_eq!(advanced, expected);
}

#[then(expr = "the push reports buyers {string}")]
async fn check_pushed_buyers(world: &mut PushWorld, buyers: String) {
    let expected = parse_list(&buyers).into_iter().map(BuyerId::from).collect::<Vec<_>>();
    assert_eq!(world.pushed().buyer_ids, expected);
}

#[then(expr = "the push fails with {word}")]
async fn push_fails(world: &mut PushWorld, code: String) {
    assert_eq!(world.push_error().kind().code(), code);
}

#[then(expr = "order {word} has progress {int}")]
async fn check_progress(world: &mut PushWorld, order_id: String, progress: i64) {
    let order = stored_order(world, &order_id).await;
    assert_eq!(order.progress, progress);
    order.check_invariants().expect("Stored order is inconsistent");
    let scheduled = world.system().index.get(&order.schedule_key());
    if let Some(entry) = scheduled {
        assert_eq!(entry.progress, progress, "The schedule disagrees with the store");
    }
}

#[then(expr = "order {word} is complete")]
async fn check_complete(world: &mut PushWorld, order_id: String) {
    let order = stored_order(world, &order_id).await;
    assert!(order.completed);
    assert!(!world.system().index.contains(&order.schedule_key()), "Completed order is still scheduled");
}

#[then(expr = "order {word} is scheduled")]
async fn check_scheduled(world: &mut PushWorld, order_id: String) {
    let order = stored_order(world, &order_id).await;
    assert!(!order.completed);
    assert!(world.system().index.contains(&order.schedule_key()));
}

#[then(expr = "the checkpoint of '{word}' is order {word}")]
async fn check_checkpoint(world: &mut PushWorld, buyer_id: String, order_id: String) {
    let order = stored_order(world, &order_id).await;
    let db = &world.system().db;
    let checkpoint =
        db.fetch_checkpoint(&BuyerId::from(buyer_id)).await.expect("Error fetching checkpoint").expect("No buyer");
    assert_eq!(checkpoint, order.schedule_key());
}

#[then(expr = "the checkpoint of '{word}' has not moved")]
async fn check_checkpoint_origin(world: &mut PushWorld, buyer_id: String) {
    let db = &world.system().db;
    let checkpoint =
        db.fetch_checkpoint(&BuyerId::from(buyer_id)).await.expect("Error fetching checkpoint").expect("No buyer");
    assert_eq!(checkpoint, ScheduleKey::origin());
}

#[then(expr = "{int} orders are scheduled")]
async fn check_schedule_size(world: &mut PushWorld, count: usize) {
    assert_eq!(world.system().index.len(), count);
}
