use std::sync::Arc;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use fanpush_engine::{
    db_types::{Coins, ScheduleKey},
    events::EventProducers,
    traits::PushGatewayError,
    BuyerApi,
    OrderLedgerApi,
    PushSchedulerApi,
    ScheduleIndex,
};
use serde_json::json;

use super::{
    helpers::{get_request, json},
    mocks::{buyer, order, MockFanPushStore},
};
use crate::{
    config::ServerOptions,
    routes::{BuyFollowerRoute, CoinsRoute, GetUserRoute, InfoRoute, ProgressRoute},
};

const OPTIONS: ServerOptions = ServerOptions { push_count: 2, api_version: 1 };

fn ledger_routes(store: MockFanPushStore, index: Arc<ScheduleIndex>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderLedgerApi::new(store, index, EventProducers::default());
        cfg.service(
            web::scope("/getfollowers")
                .service(CoinsRoute::<MockFanPushStore>::new())
                .service(BuyFollowerRoute::<MockFanPushStore>::new()),
        )
        .app_data(web::Data::new(OPTIONS))
        .app_data(web::Data::new(api));
    }
}

fn push_routes(store: MockFanPushStore, index: Arc<ScheduleIndex>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = PushSchedulerApi::new(store, index, EventProducers::default());
        cfg.service(web::scope("/getfollowers").service(GetUserRoute::<MockFanPushStore>::new()))
            .app_data(web::Data::new(OPTIONS))
            .app_data(web::Data::new(api));
    }
}

fn query_routes(store: MockFanPushStore, lazy_create: bool) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = BuyerApi::new(store).with_lazy_create(lazy_create);
        cfg.service(
            web::scope("/getfollowers")
                .service(InfoRoute::<MockFanPushStore>::new())
                .service(ProgressRoute::<MockFanPushStore>::new()),
        )
        .app_data(web::Data::new(OPTIONS))
        .app_data(web::Data::new(api));
    }
}

fn scheduled_index() -> Arc<ScheduleIndex> {
    let index = Arc::new(ScheduleIndex::new());
    index.insert(&order("bob", "o1", 100, 0, 5));
    index.insert(&order("carol", "o2", 101, 4, 5));
    index.insert(&order("alice", "o3", 102, 0, 5));
    index
}

//----------------------------------------------   Coins  ----------------------------------------------------

#[actix_web::test]
async fn coins_credits_the_buyer() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store
        .expect_credit_buyer()
        .withf(|buyer_id, amount| buyer_id.as_str() == "alice" && *amount == Coins::from(10))
        .times(1)
        .returning(|_, _| Ok(buyer("alice", 15)));
    let routes = ledger_routes(store, Arc::new(ScheduleIndex::new()));
    let (status, body) =
        get_request("/getfollowers/coins?userId=alice&version=1&coins=10", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"userId":"alice","coins":15}"#);
}

#[actix_web::test]
async fn coins_rejects_the_wrong_version() {
    let _ = env_logger::try_init().ok();
    let routes = ledger_routes(MockFanPushStore::new(), Arc::new(ScheduleIndex::new()));
    let (status, body) =
        get_request("/getfollowers/coins?userId=alice&version=2&coins=10", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "INVALID_PARAMETERS");
}

#[actix_web::test]
async fn coins_requires_a_user_id() {
    let _ = env_logger::try_init().ok();
    let routes = ledger_routes(MockFanPushStore::new(), Arc::new(ScheduleIndex::new()));
    let (status, body) = get_request("/getfollowers/coins?version=1&coins=10", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "INVALID_PARAMETERS");
}

#[actix_web::test]
async fn coins_must_be_positive() {
    let _ = env_logger::try_init().ok();
    let routes = ledger_routes(MockFanPushStore::new(), Arc::new(ScheduleIndex::new()));
    let (status, body) =
        get_request("/getfollowers/coins?userId=alice&version=1&coins=-3", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "INVALID_PARAMETERS");
}

//----------------------------------------------   Purchase  ----------------------------------------------------

#[actix_web::test]
async fn buy_follower_schedules_the_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store
        .expect_debit_and_append_order()
        .withf(|order| {
            order.buyer_id.as_str() == "alice" && order.coins_spent == Coins::from(10) && order.fans_target == 5
        })
        .times(1)
        .returning(|order| Ok((order.into_order(), Coins::from(7))));
    let index = Arc::new(ScheduleIndex::new());
    let routes = ledger_routes(store, Arc::clone(&index));
    let (status, body) = get_request("/getfollowers/buyfollower?userId=alice&version=1&coins=10&value=5", routes)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["coins"], 7);
    let order_id = body["orderId"].as_str().expect("orderId is missing");
    assert_eq!(order_id.len(), 36);
    let keys = index.keys();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].order_id.as_str(), order_id);
    assert_eq!(keys[0].buyer_id.as_str(), "alice");
}

#[actix_web::test]
async fn buy_follower_with_insufficient_funds() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store.expect_debit_and_append_order().times(1).returning(|order| {
        Err(PushGatewayError::InsufficientFunds {
            buyer_id: order.buyer_id,
            requested: order.coins_spent,
            available: Coins::from(3),
        })
    });
    let index = Arc::new(ScheduleIndex::new());
    let routes = ledger_routes(store, Arc::clone(&index));
    let (status, body) = get_request("/getfollowers/buyfollower?userId=alice&version=1&coins=10&value=5", routes)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json(&body)["code"], "INSUFFICIENT_FUNDS");
    assert!(index.is_empty());
}

#[actix_web::test]
async fn buy_follower_with_a_bad_fan_count() {
    let _ = env_logger::try_init().ok();
    for value in ["0", "-1", "ten"] {
        let routes = ledger_routes(MockFanPushStore::new(), Arc::new(ScheduleIndex::new()));
        let path = format!("/getfollowers/buyfollower?userId=alice&version=1&coins=10&value={value}");
        let (status, body) = get_request(&path, routes).await.expect("Request failed");
        assert_eq!(status, StatusCode::BAD_REQUEST, "value={value}");
        assert_eq!(json(&body)["code"], "INVALID_PARAMETERS");
    }
}

//----------------------------------------------   Push  ----------------------------------------------------

#[actix_web::test]
async fn get_user_pushes_the_next_due_orders() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store.expect_fetch_checkpoint().times(1).returning(|_| Ok(Some(ScheduleKey::origin())));
    store
        .expect_advance_progress()
        .withf(|batch| {
            batch.requester.as_str() == "alice" &&
                batch.previous_checkpoint == ScheduleKey::origin() &&
                batch.new_checkpoint.order_id.as_str() == "o2" &&
                batch.updates.len() == 2
        })
        .times(1)
        .returning(|_| Ok(()));
    let index = scheduled_index();
    let routes = push_routes(store, Arc::clone(&index));
    let (status, body) =
        get_request("/getfollowers/getuser?userId=alice&version=1", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"userIDs":["bob","carol"]}"#);
    let keys = index.keys().into_iter().map(|k| k.order_id.as_str().to_string()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["o1", "o3"]);
    assert_eq!(index.get(&order("bob", "o1", 100, 0, 5).schedule_key()).unwrap().progress, 1);
}

#[actix_web::test]
async fn get_user_with_nothing_due() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    let last = order("alice", "o3", 102, 0, 5).schedule_key();
    store.expect_fetch_checkpoint().times(1).returning(move |_| Ok(Some(last.clone())));
    let routes = push_routes(store, scheduled_index());
    let (status, body) =
        get_request("/getfollowers/getuser?userId=alice&version=1", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["code"], "NO_CANDIDATES");
}

#[actix_web::test]
async fn get_user_for_an_unknown_buyer() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store.expect_fetch_checkpoint().times(1).returning(|_| Ok(None));
    let routes = push_routes(store, scheduled_index());
    let (status, body) =
        get_request("/getfollowers/getuser?userId=zed&version=1", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn get_user_when_the_store_rejects_the_batch() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store.expect_fetch_checkpoint().times(1).returning(|_| Ok(Some(ScheduleKey::origin())));
    store
        .expect_advance_progress()
        .times(1)
        .returning(|_| Err(PushGatewayError::DatabaseError("disk I/O error".into())));
    let index = scheduled_index();
    let before = index.keys();
    let routes = push_routes(store, Arc::clone(&index));
    let (status, body) =
        get_request("/getfollowers/getuser?userId=alice&version=1", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(&body)["code"], "STORE_OPERATION_FAILURE");
    assert_eq!(index.keys(), before);
    assert_eq!(index.get(&order("bob", "o1", 100, 0, 5).schedule_key()).unwrap().progress, 0);
}

#[actix_web::test]
async fn get_user_catches_up_after_losing_a_race() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store.expect_fetch_checkpoint().times(2).returning(|_| Ok(Some(ScheduleKey::origin())));
    // Another push already delivered a fan to o1 and completed o2
    let mut attempts = 0;
    store.expect_advance_progress().times(2).returning(move |batch| {
        attempts += 1;
        if attempts == 1 {
            Err(PushGatewayError::StaleProgress(batch.updates[0].order_id().clone()))
        } else {
            Ok(())
        }
    });
    store.expect_fetch_order_by_order_id().times(2).returning(|id| {
        Ok(Some(match id.as_str() {
            "o1" => order("bob", "o1", 100, 1, 5),
            _ => order("carol", "o2", 101, 5, 5),
        }))
    });
    let index = scheduled_index();
    let routes = push_routes(store, Arc::clone(&index));
    let (status, body) =
        get_request("/getfollowers/getuser?userId=alice&version=1", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"userIDs":["bob","alice"]}"#);
    assert_eq!(index.get(&order("bob", "o1", 100, 0, 5).schedule_key()).unwrap().progress, 2);
    assert!(!index.contains(&order("carol", "o2", 101, 0, 5).schedule_key()));
}

//----------------------------------------------   Queries  ----------------------------------------------------

#[actix_web::test]
async fn info_for_a_buyer() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store.expect_fetch_buyer().times(1).returning(|_| Ok(Some(buyer("alice", 12))));
    store
        .expect_fetch_orders_for_buyer()
        .times(1)
        .returning(|_| Ok(vec![order("alice", "o1", 100, 2, 5), order("alice", "o2", 101, 3, 3)]));
    let routes = query_routes(store, false);
    let (status, body) =
        get_request("/getfollowers/info?userId=alice&version=1", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&body),
        json!({
            "buyerId": "alice",
            "coinBalance": 12,
            "orders": [
                { "orderId": "o1", "fansTarget": 5, "progress": 2, "completed": false },
                { "orderId": "o2", "fansTarget": 3, "progress": 3, "completed": true },
            ]
        })
    );
}

#[actix_web::test]
async fn progress_for_an_unknown_buyer() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store.expect_fetch_buyer().times(1).returning(|_| Ok(None));
    let routes = query_routes(store, false);
    let (status, body) =
        get_request("/getfollowers/progress?userId=zed&version=1", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn progress_creates_unknown_buyers_when_lazy_create_is_on() {
    let _ = env_logger::try_init().ok();
    let mut store = MockFanPushStore::new();
    store.expect_fetch_or_create_buyer().times(1).returning(|id| Ok(buyer(id.as_str(), 0)));
    store.expect_fetch_orders_for_buyer().times(1).returning(|_| Ok(vec![]));
    let routes = query_routes(store, true);
    let (status, body) =
        get_request("/getfollowers/progress?userId=dave&version=1", routes).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({ "buyerId": "dave", "orders": [] }));
}

#[actix_web::test]
async fn malformed_query_strings_are_invalid_parameters() {
    let _ = env_logger::try_init().ok();
    let routes = query_routes(MockFanPushStore::new(), false);
    let (status, body) = get_request("/getfollowers/info?userId=alice&userId=bob&version=1", routes)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "INVALID_PARAMETERS");
}
