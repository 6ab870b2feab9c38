//! Precision-safe decimal types for position accounting.
//!
//! Uses `rust_decimal` for exact decimal arithmetic so that weighted entry
//! prices and realized PnL never accumulate floating-point drift.

use crate::error::{CoreError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

macro_rules! decimal_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Decimal);

        impl $name {
            pub const ZERO: Self = Self(Decimal::ZERO);

            #[inline]
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            #[inline]
            pub fn inner(&self) -> Decimal {
                self.0
            }

            #[inline]
            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            #[inline]
            pub fn is_positive(&self) -> bool {
                self.0 > Decimal::ZERO
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<Decimal> for $name {
            fn from(d: Decimal) -> Self {
                Self(d)
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }
    };
}

decimal_newtype!(
    /// Price with exact decimal precision.
    ///
    /// Used for fill prices, entry prices and mark prices.
    Price
);

decimal_newtype!(
    /// Quantity magnitude with exact decimal precision.
    ///
    /// Always a non-negative magnitude: the direction lives on the
    /// exposure's tag, never in the sign of the quantity.
    Quantity
);

impl Quantity {
    /// Validate that the quantity is a non-negative magnitude.
    pub fn try_magnitude(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(CoreError::InvalidQuantity(format!(
                "{value} is negative; quantities are magnitudes"
            )));
        }
        Ok(Self(value))
    }

    /// Notional value: quantity * price, `Overflow` if it does not fit.
    #[inline]
    pub fn checked_notional(&self, price: Price) -> Result<Decimal> {
        self.0
            .checked_mul(price.0)
            .ok_or_else(|| CoreError::Overflow(format!("{self} * {price}")))
    }

    /// Add, `Overflow` if the sum does not fit in a `Decimal`.
    #[inline]
    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| CoreError::Overflow(format!("{self} + {rhs}")))
    }

    /// Subtract, returning `None` instead of going negative.
    #[inline]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        if rhs.0 > self.0 {
            None
        } else {
            Some(Self(self.0 - rhs.0))
        }
    }
}
