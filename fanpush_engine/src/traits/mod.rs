//! # Store contracts
//!
//! This module defines the interface contracts that durable store *backends* must satisfy to back the fan push
//! engine. The engine never talks to a database directly; it goes through these traits.
//!
//! * [`FanPushDatabase`] is the mutation contract: crediting and debiting buyer balances, appending orders, reading
//!   push checkpoints, applying push batches atomically and loading the pending orders at startup.
//! * [`BuyerManagement`] provides read-only queries over buyers and their orders, plus the lazy-create policy used by
//!   read paths.
mod buyer_management;
mod fan_push_database;

pub use buyer_management::{BuyerApiError, BuyerManagement};
pub use fan_push_database::{FanPushDatabase, PushGatewayError};
