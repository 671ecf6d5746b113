use std::{env, fmt::Display, str::FromStr};

use fanpush_common::helpers::parse_boolean_flag;
use fanpush_engine::{PushPolicy, DEFAULT_MAX_PUSH_BATCH};
use log::*;

const DEFAULT_FPS_HOST: &str = "127.0.0.1";
const DEFAULT_FPS_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/fanpush.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_PUSH_COUNT: usize = 2;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;
const DEFAULT_API_VERSION: u32 = 1;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// If true, pending migrations are applied before the schedule is loaded.
    pub auto_migrate: bool,
    /// The number of orders a `/getfollowers/getuser` call asks to advance.
    pub push_count: usize,
    /// The upper bound on the number of orders any single push may advance.
    pub max_push_batch: usize,
    /// If true, a buyer's pushes never advance their own orders.
    pub skip_own_orders: bool,
    /// If true, read-only queries for an unknown buyer create that buyer with a zero balance instead of failing.
    pub lazy_create_buyers: bool,
    pub event_buffer_size: usize,
    /// Every request must carry this value in its `version` parameter.
    pub api_version: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FPS_HOST.to_string(),
            port: DEFAULT_FPS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            auto_migrate: true,
            push_count: DEFAULT_PUSH_COUNT,
            max_push_batch: DEFAULT_MAX_PUSH_BATCH,
            skip_own_orders: false,
            lazy_create_buyers: false,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            api_version: DEFAULT_API_VERSION,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from whatever `lookup` returns for each `FPS_*` variable. Missing or invalid values
    /// fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let host = lookup("FPS_HOST").unwrap_or_else(|| DEFAULT_FPS_HOST.into());
        let port = parse_or_default(&lookup, "FPS_PORT", DEFAULT_FPS_PORT);
        let database_url = lookup("FPS_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ FPS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let db_max_connections = parse_or_default(&lookup, "FPS_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let auto_migrate = parse_boolean_flag(lookup("FPS_AUTO_MIGRATE"), true);
        let mut max_push_batch = parse_or_default(&lookup, "FPS_MAX_PUSH_BATCH", DEFAULT_MAX_PUSH_BATCH);
        if max_push_batch == 0 {
            warn!("🪛️ FPS_MAX_PUSH_BATCH cannot be zero. Using the default, {DEFAULT_MAX_PUSH_BATCH}, instead.");
            max_push_batch = DEFAULT_MAX_PUSH_BATCH;
        }
        let mut push_count = parse_or_default(&lookup, "FPS_PUSH_COUNT", DEFAULT_PUSH_COUNT);
        if push_count == 0 || push_count > max_push_batch {
            let clamped = push_count.clamp(1, max_push_batch);
            warn!(
                "🪛️ FPS_PUSH_COUNT ({push_count}) must be between 1 and {max_push_batch}. Using {clamped} instead."
            );
            push_count = clamped;
        }
        let skip_own_orders = parse_boolean_flag(lookup("FPS_SKIP_OWN_ORDERS"), false);
        let lazy_create_buyers = parse_boolean_flag(lookup("FPS_LAZY_CREATE_BUYERS"), false);
        let mut event_buffer_size = parse_or_default(&lookup, "FPS_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        if event_buffer_size == 0 {
            warn!(
                "🪛️ FPS_EVENT_BUFFER_SIZE cannot be zero. Using the default, {DEFAULT_EVENT_BUFFER_SIZE}, instead."
            );
            event_buffer_size = DEFAULT_EVENT_BUFFER_SIZE;
        }
        let api_version = parse_or_default(&lookup, "FPS_API_VERSION", DEFAULT_API_VERSION);
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            auto_migrate,
            push_count,
            max_push_batch,
            skip_own_orders,
            lazy_create_buyers,
            event_buffer_size,
            api_version,
        }
    }

    pub fn push_policy(&self) -> PushPolicy {
        PushPolicy { max_batch: self.max_push_batch, skip_own_orders: self.skip_own_orders }
    }
}

fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(name) {
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        None => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that request handlers need. Generally we try to keep this as small as
/// possible.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub push_count: usize,
    pub api_version: u32,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { push_count: config.push_count, api_version: config.api_version }
    }
}
