//! Events delivered by the execution engine.
//!
//! Fills have already been matched by the time they reach position
//! accounting. Nothing here decides whether a fill should happen, only
//! how it is described.

use crate::decimal::{Price, Quantity};
use crate::error::{CoreError, Result};
use crate::instrument::InstrumentKey;
use crate::side::{OrderAction, PositionSide};
use serde::{Deserialize, Serialize};

/// A matched trade to be applied to an exposure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Venue and instrument of the fill.
    #[serde(flatten)]
    pub key: InstrumentKey,
    /// Buy or sell.
    pub action: OrderAction,
    /// Filled quantity (strictly positive).
    pub quantity: Quantity,
    /// Fill price (strictly positive).
    pub price: Price,
    /// Targeted exposure in hedge mode.
    ///
    /// `None` for orders that do not know which leg they belong to,
    /// typically auto-generated stop-loss / take-profit orders.
    #[serde(default, alias = "target_direction")]
    pub position_side: Option<PositionSide>,
    /// Reduce-only flag carried by the originating order.
    #[serde(default)]
    pub is_reducing: bool,
    /// Match timestamp (Unix ms).
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl Fill {
    /// Create a directionless, non-reducing fill.
    pub fn new(key: InstrumentKey, action: OrderAction, quantity: Quantity, price: Price) -> Self {
        Self {
            key,
            action,
            quantity,
            price,
            position_side: None,
            is_reducing: false,
            timestamp_ms: 0,
        }
    }

    /// Target a specific exposure.
    #[must_use]
    pub fn targeting(mut self, side: PositionSide) -> Self {
        self.position_side = Some(side);
        self
    }

    /// Mark the fill as reduce-only.
    #[must_use]
    pub fn reducing(mut self) -> Self {
        self.is_reducing = true;
        self
    }

    #[must_use]
    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Reject zero/negative quantities and prices.
    pub fn validate(&self) -> Result<()> {
        if !self.quantity.is_positive() {
            return Err(CoreError::InvalidQuantity(format!(
                "fill quantity must be positive, got {}",
                self.quantity
            )));
        }
        if !self.price.is_positive() {
            return Err(CoreError::InvalidPrice(format!(
                "fill price must be positive, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

/// Mark price update, delivered once per time step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPriceUpdate {
    #[serde(flatten)]
    pub key: InstrumentKey,
    pub price: Price,
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl MarkPriceUpdate {
    pub fn new(key: InstrumentKey, price: Price) -> Self {
        Self {
            key,
            price,
            timestamp_ms: 0,
        }
    }
}
