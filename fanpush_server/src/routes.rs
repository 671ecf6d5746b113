//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every store call is therefore async, and the schedule index lock is
//! only ever held for in-memory work.
//!
//! All `/getfollowers` routes are `GET` requests that carry their arguments in the query string. Every one of them
//! requires a `userId` and a `version` that matches the configured API version.
use actix_web::{get, web, HttpResponse, Responder};
use fanpush_engine::{
    traits::{BuyerManagement, FanPushDatabase},
    BuyerApi,
    OrderLedgerApi,
    PushSchedulerApi,
};
use log::*;

use crate::{
    config::ServerOptions,
    data_objects::{BalanceResponse, FollowerParams, PurchaseResponse, PushResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Coins  ----------------------------------------------------
route!(coins => Get "/coins" impl FanPushDatabase);
/// Credits `coins` to the user, creating the user if this is the first time we have seen them.
///
/// Responds with the user's new balance.
pub async fn coins<B: FanPushDatabase>(
    params: web::Query<FollowerParams>,
    options: web::Data<ServerOptions>,
    api: web::Data<OrderLedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let buyer_id = params.buyer_id()?;
    params.check_version(options.api_version)?;
    let coins = params.coins()?;
    debug!("💻️ GET coins. Crediting {buyer_id} with {coins}");
    let buyer = api.credit(&buyer_id, coins).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse { user_id: buyer.buyer_id, coins: buyer.coin_balance }))
}

// ----------------------------------------------   Purchase  ----------------------------------------------------
route!(buy_follower => Get "/buyfollower" impl FanPushDatabase);
/// Spends `coins` on an order for `value` fans. The order joins the push schedule immediately.
///
/// Responds with the new order id and the user's remaining balance.
pub async fn buy_follower<B: FanPushDatabase>(
    params: web::Query<FollowerParams>,
    options: web::Data<ServerOptions>,
    api: web::Data<OrderLedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let buyer_id = params.buyer_id()?;
    params.check_version(options.api_version)?;
    let coins = params.coins()?;
    let fans = params.fans()?;
    debug!("💻️ GET buyfollower. {buyer_id} is buying {fans} fans for {coins}");
    let result = api.purchase(&buyer_id, coins, fans).await?;
    Ok(HttpResponse::Ok().json(PurchaseResponse { order_id: result.order.order_id, coins: result.balance }))
}

// ----------------------------------------------   Push  ----------------------------------------------------
route!(get_user => Get "/getuser" impl FanPushDatabase);
/// The push endpoint. Advances the next due orders after the user's checkpoint by one fan each.
///
/// Responds with the owners of the advanced orders, so the client can follow them.
pub async fn get_user<B: FanPushDatabase>(
    params: web::Query<FollowerParams>,
    options: web::Data<ServerOptions>,
    api: web::Data<PushSchedulerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let buyer_id = params.buyer_id()?;
    params.check_version(options.api_version)?;
    trace!("💻️ GET getuser. {buyer_id} is pushing {} orders", options.push_count);
    let outcome = api.push(&buyer_id, options.push_count).await?;
    Ok(HttpResponse::Ok().json(PushResponse { user_ids: outcome.buyer_ids }))
}

// ----------------------------------------------   Queries  ----------------------------------------------------
route!(info => Get "/info" impl BuyerManagement);
pub async fn info<B: BuyerManagement>(
    params: web::Query<FollowerParams>,
    options: web::Data<ServerOptions>,
    api: web::Data<BuyerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let buyer_id = params.buyer_id()?;
    params.check_version(options.api_version)?;
    debug!("💻️ GET info for {buyer_id}");
    let info = api.info(&buyer_id).await?;
    Ok(HttpResponse::Ok().json(info))
}

route!(progress => Get "/progress" impl BuyerManagement);
pub async fn progress<B: BuyerManagement>(
    params: web::Query<FollowerParams>,
    options: web::Data<ServerOptions>,
    api: web::Data<BuyerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let buyer_id = params.buyer_id()?;
    params.check_version(options.api_version)?;
    debug!("💻️ GET progress for {buyer_id}");
    let progress = api.progress(&buyer_id).await?;
    Ok(HttpResponse::Ok().json(progress))
}
