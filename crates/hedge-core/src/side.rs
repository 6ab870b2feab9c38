//! Direction vocabulary.
//!
//! Three distinct notions that are easy to conflate:
//! - [`OrderAction`]: what an order did (buy or sell)
//! - [`Direction`]: which way an exposure points (long or short)
//! - [`PositionSide`]: the tag carried by an exposure record, which adds
//!   `none` for the single exposure used in one-way mode

use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order action: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    Buy,
    Sell,
}

impl OrderAction {
    /// Returns the opposite action.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exposure direction: long or short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// The direction a fresh exposure takes when opened by `action`.
    pub fn from_action(action: OrderAction) -> Self {
        match action {
            OrderAction::Buy => Self::Long,
            OrderAction::Sell => Self::Short,
        }
    }

    /// Returns +1 for long, -1 for short (for PnL calculations).
    pub fn sign(&self) -> Decimal {
        match self {
            Self::Long => Decimal::ONE,
            Self::Short => Decimal::NEGATIVE_ONE,
        }
    }

    /// The action that grows an exposure in this direction.
    pub fn opening_action(&self) -> OrderAction {
        match self {
            Self::Long => OrderAction::Buy,
            Self::Short => OrderAction::Sell,
        }
    }

    /// The action that shrinks an exposure in this direction.
    pub fn closing_action(&self) -> OrderAction {
        self.opening_action().opposite()
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directional tag of an exposure record.
///
/// `Long` and `Short` are the two legs of a hedge-mode pair. `None` is the
/// single exposure of a one-way instrument, whose direction follows
/// whatever was opened last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
    None,
}

impl PositionSide {
    /// Fixed direction of a hedge leg; `None` for the one-way tag.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::Long => Some(Direction::Long),
            Self::Short => Some(Direction::Short),
            Self::None => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
            Self::None => "none",
        }
    }
}

impl From<Direction> for PositionSide {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Long => Self::Long,
            Direction::Short => Self::Short,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionSide {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            "none" => Ok(Self::None),
            other => Err(CoreError::InvalidDirection(other.to_string())),
        }
    }
}
