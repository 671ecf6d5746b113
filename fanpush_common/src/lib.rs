//! Value types shared between the fan push engine and the server.
mod coins;

pub mod helpers;
pub mod op;

pub use coins::{Coins, CoinsConversionError};
