//! # Fan push engine public API
//!
//! The `fpe_api` module exposes the programmatic API of the engine. Each API object wraps a store backend that
//! implements the traits it needs, so callers can pick just the parts they use.
//!
//! * [`order_ledger_api`] credits coins and turns them into orders.
//! * [`push_scheduler_api`] advances due orders, one fan at a time.
//! * [`bootstrap`] rebuilds the in-memory schedule from the store at startup.
//! * [`buyer_api`] answers read-only questions about buyers and their order progress.
//!
//! The ledger, the scheduler and the bootstrapper must share one [`ScheduleIndex`].
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fanpush_engine::{events::EventProducers, Bootstrapper, PushSchedulerApi, ScheduleIndex, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let index = Arc::new(ScheduleIndex::new());
//! Bootstrapper::new(db.clone(), index.clone()).load().await?;
//! let scheduler = PushSchedulerApi::new(db, index, EventProducers::default());
//! let outcome = scheduler.push(&"000000001".into(), 2).await?;
//! ```
//!
//! [`ScheduleIndex`]: crate::schedule_index::ScheduleIndex

pub mod bootstrap;
pub mod buyer_api;
pub mod errors;
pub mod ledger_objects;
pub mod order_ledger_api;
pub mod push_scheduler_api;
