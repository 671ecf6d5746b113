//! Fan Push Engine
//!
//! Buyers spend coins on orders for fans, and those fans are delivered incrementally: every time a buyer asks for a
//! push, a small batch of other buyers' orders is advanced by one fan each. This library holds the core of that
//! service. It is transport-agnostic; the HTTP server lives in `fanpush_server`.
//!
//! The library is divided into these main sections:
//! 1. Storage. The [`traits`] module defines what a store backend must provide, and [`SqliteDatabase`] is the backend
//!    shipped with the engine. The records it holds are defined in [`db_types`].
//! 2. The [`schedule_index`], an in-memory ordered cache of every incomplete order. It is derived from the store and
//!    never claims more progress than the store has committed.
//! 3. The public API ([`mod@fpe_api`]): purchasing orders, pushing, bootstrapping the schedule at startup, and read-only
//!    buyer queries.
//!
//! The engine also emits [`events`] when purchases and pushes are committed, so that the embedding application can
//! hook into them.
pub mod db_types;
pub mod events;
pub mod fpe_api;
pub mod schedule_index;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use fpe_api::{
    bootstrap::Bootstrapper,
    buyer_api::BuyerApi,
    errors::{BootstrapError, ErrorKind, SchedulerError},
    ledger_objects::{BuyerInfo, BuyerProgress, PurchaseResult, PushOutcome},
    order_ledger_api::OrderLedgerApi,
    push_scheduler_api::{PushPolicy, PushSchedulerApi, DEFAULT_MAX_PUSH_BATCH, MAX_PUSH_ATTEMPTS},
};
pub use schedule_index::ScheduleIndex;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
