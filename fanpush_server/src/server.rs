use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use fanpush_engine::{
    events::EventProducers,
    Bootstrapper,
    BuyerApi,
    OrderLedgerApi,
    PushSchedulerApi,
    ScheduleIndex,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::activity_log::create_activity_log_handlers,
    routes::{health, BuyFollowerRoute, CoinsRoute, GetUserRoute, InfoRoute, ProgressRoute},
};

/// Starts the server and runs until it is shut down.
///
/// The push schedule must be fully loaded before the first request is accepted, so the startup order is fixed:
/// connect, migrate, bootstrap the schedule, start the event handlers, and only then bind.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    }
    let index = Arc::new(ScheduleIndex::new());
    let loaded = Bootstrapper::new(db.clone(), Arc::clone(&index)).load().await.map_err(|e| {
        error!("🚀️ The push schedule could not be loaded. Refusing to serve requests. {e}");
        e
    })?;
    info!("🚀️ {loaded} pending orders are scheduled");
    let handlers = create_activity_log_handlers(config.event_buffer_size);
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, index, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    index: Arc<ScheduleIndex>,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let policy = config.push_policy();
    let lazy_create_buyers = config.lazy_create_buyers;
    let srv = HttpServer::new(move || {
        // Every worker gets its own API objects, but they all share the one schedule index.
        let ledger_api = OrderLedgerApi::new(db.clone(), Arc::clone(&index), producers.clone());
        let push_api = PushSchedulerApi::new(db.clone(), Arc::clone(&index), producers.clone()).with_policy(policy);
        let buyer_api = BuyerApi::new(db.clone()).with_lazy_create(lazy_create_buyers);
        let followers_scope = web::scope("/getfollowers")
            .service(CoinsRoute::<SqliteDatabase>::new())
            .service(BuyFollowerRoute::<SqliteDatabase>::new())
            .service(GetUserRoute::<SqliteDatabase>::new())
            .service(InfoRoute::<SqliteDatabase>::new())
            .service(ProgressRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fps::access_log"))
            .app_data(query_config())
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(push_api))
            .app_data(web::Data::new(buyer_api))
            .service(health)
            .service(followers_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed query strings are reported like any other invalid parameter.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| ServerError::InvalidParameters(err.to_string()).into())
}
