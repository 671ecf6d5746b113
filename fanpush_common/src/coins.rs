use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------        Coins          ---------------------------------------------------------
/// An amount of the in-app coin currency. Buyers spend coins to purchase fan delivery orders.
///
/// Balances are stored as signed integers so that the database can enforce the non-negative constraint itself, but a
/// buyer balance is never allowed to drop below zero.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Coins(i64);

op!(binary Coins, Add, add);
op!(binary Coins, Sub, sub);
op!(inplace Coins, AddAssign, add_assign);
op!(inplace Coins, SubAssign, sub_assign);
op!(unary Coins, Neg, neg);

impl Sum for Coins {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a coin amount: {0}")]
pub struct CoinsConversionError(String);

impl From<i64> for Coins {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Coins {
    type Error = CoinsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| CoinsConversionError(format!("{value} is too large to convert to Coins")))
    }
}

impl Display for Coins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            1 | -1 => write!(f, "{} coin", self.0),
            v => write!(f, "{v} coins"),
        }
    }
}

impl Coins {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Subtracts `rhs`, returning `None` if the result would be negative or overflow.
    pub fn checked_debit(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).filter(|v| *v >= 0).map(Self)
    }
}
