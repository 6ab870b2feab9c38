//! Long/short exposure pair for hedge mode.
//!
//! The pair owns both directional exposures of one instrument and decides
//! which of them absorbs each fill. Fills that name their target leg go
//! straight to it. Directionless fills (protective orders that do not know
//! which leg they belong to) are routed by a [`RoutingPolicy`].

use hedge_core::{Direction, Fill, InstrumentKey, OrderAction, PositionSide, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{PositionError, PositionResult};
use crate::exposure::{Exposure, ExposureSync, FillOutcome};
use crate::snapshot::PairSnapshot;

// ============================================================================
// Routing
// ============================================================================

/// Rule used to pick a leg for fills without an explicit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// Buy goes long if long is open or short is closed, else reduces short.
    /// Sell goes short if short is open or long is closed, else reduces long.
    #[default]
    PreferOpenSide,
    /// Buy always goes long, sell always goes short.
    ActionSide,
}

impl RoutingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreferOpenSide => "prefer_open_side",
            Self::ActionSide => "action_side",
        }
    }
}

impl fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leg chosen for a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub direction: Direction,
    /// True when the fill carried no target and the policy picked the leg.
    pub inferred: bool,
}

impl Route {
    /// Label for the fills counter.
    pub fn label(&self) -> &'static str {
        if self.inferred {
            "inferred"
        } else {
            "explicit"
        }
    }
}

/// Sign of the pair's net quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetDirection {
    Long,
    Short,
    Flat,
}

impl NetDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
            Self::Flat => "flat",
        }
    }
}

impl fmt::Display for NetDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Direction> for NetDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Long => Self::Long,
            Direction::Short => Self::Short,
        }
    }
}

/// Per-leg authoritative updates. Absent legs are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSync {
    #[serde(default)]
    pub long: Option<ExposureSync>,
    #[serde(default)]
    pub short: Option<ExposureSync>,
}

// ============================================================================
// ExposurePair
// ============================================================================

/// Both directional exposures of one instrument.
#[derive(Debug, Clone)]
pub struct ExposurePair {
    key: InstrumentKey,
    long: Exposure,
    short: Exposure,
    routing: RoutingPolicy,
}

impl ExposurePair {
    pub fn new(key: InstrumentKey) -> Self {
        Self::with_routing(key, RoutingPolicy::default())
    }

    pub fn with_routing(key: InstrumentKey, routing: RoutingPolicy) -> Self {
        Self {
            long: Exposure::new(key.clone(), PositionSide::Long),
            short: Exposure::new(key.clone(), PositionSide::Short),
            key,
            routing,
        }
    }

    pub fn key(&self) -> &InstrumentKey {
        &self.key
    }

    pub fn routing(&self) -> RoutingPolicy {
        self.routing
    }

    pub fn long(&self) -> &Exposure {
        &self.long
    }

    pub fn short(&self) -> &Exposure {
        &self.short
    }

    pub fn exposure(&self, direction: Direction) -> &Exposure {
        match direction {
            Direction::Long => &self.long,
            Direction::Short => &self.short,
        }
    }

    fn exposure_mut(&mut self, direction: Direction) -> &mut Exposure {
        match direction {
            Direction::Long => &mut self.long,
            Direction::Short => &mut self.short,
        }
    }

    /// Leg addressed by a directional tag. `none` has no leg in a pair.
    pub fn get_exposure(&self, side: PositionSide) -> PositionResult<&Exposure> {
        side.direction()
            .map(|d| self.exposure(d))
            .ok_or_else(|| {
                PositionError::InvalidDirection(format!(
                    "{} has no {} exposure in hedge mode",
                    self.key, side
                ))
            })
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    /// `long.quantity - short.quantity`
    pub fn net_quantity(&self) -> Decimal {
        self.long.quantity().inner() - self.short.quantity().inner()
    }

    pub fn total_realized_pnl(&self) -> Decimal {
        self.long.realized_pnl().saturating_add(self.short.realized_pnl())
    }

    pub fn total_unrealized_pnl(&self) -> Decimal {
        self.long.unrealized_pnl().saturating_add(self.short.unrealized_pnl())
    }

    pub fn total_pnl(&self) -> Decimal {
        self.total_realized_pnl().saturating_add(self.total_unrealized_pnl())
    }

    /// Both legs valued at the mark price.
    pub fn total_notional_value(&self) -> Decimal {
        self.long.notional_value().saturating_add(self.short.notional_value())
    }

    pub fn is_open_any(&self) -> bool {
        self.long.is_open() || self.short.is_open()
    }

    pub fn is_fully_closed(&self) -> bool {
        self.long.is_close() && self.short.is_close()
    }

    /// Both legs open with equal size.
    pub fn is_fully_hedged(&self) -> bool {
        self.long.is_open() && self.short.is_open() && self.net_quantity().is_zero()
    }

    /// Net direction of the pair.
    ///
    /// `Flat` only when both legs are closed. Both legs open with zero net
    /// returns `AmbiguousNetDirection` so callers can tell it apart from
    /// an empty pair.
    pub fn dominant_direction(&self) -> PositionResult<NetDirection> {
        if self.is_fully_closed() {
            return Ok(NetDirection::Flat);
        }
        let net = self.net_quantity();
        if net > Decimal::ZERO {
            Ok(NetDirection::Long)
        } else if net < Decimal::ZERO {
            Ok(NetDirection::Short)
        } else {
            Err(PositionError::AmbiguousNetDirection {
                key: self.key.clone(),
                quantity: self.long.quantity(),
            })
        }
    }

    /// Net direction with the fully hedged case collapsed to `Flat`.
    pub fn net_direction_lossy(&self) -> NetDirection {
        self.dominant_direction().unwrap_or(NetDirection::Flat)
    }

    /// Leg selected by [`Self::dominant_direction`], if any.
    pub fn dominant_exposure(&self) -> Option<&Exposure> {
        match self.dominant_direction() {
            Ok(NetDirection::Long) => Some(&self.long),
            Ok(NetDirection::Short) => Some(&self.short),
            Ok(NetDirection::Flat) | Err(_) => None,
        }
    }

    /// Quantity-weighted entry across open legs; `None` when both are closed.
    ///
    /// Falls back to scaling each entry by its share of the open quantity
    /// when `quantity * entry` leaves the `Decimal` range.
    pub fn weighted_entry_price(&self) -> Option<Price> {
        let legs: Vec<(Decimal, Price)> = [&self.long, &self.short]
            .into_iter()
            .filter(|exposure| exposure.is_open())
            .filter_map(|exposure| Some((exposure.quantity().inner(), exposure.entry_price()?)))
            .collect();
        let total = legs
            .iter()
            .fold(Decimal::ZERO, |sum, (quantity, _)| sum.saturating_add(*quantity));
        if total.is_zero() {
            return None;
        }
        let exact = legs
            .iter()
            .try_fold(Decimal::ZERO, |sum, (quantity, entry)| {
                sum.checked_add(entry.inner().checked_mul(*quantity)?)
            })
            .and_then(|weighted| weighted.checked_div(total));
        let weighted = exact.unwrap_or_else(|| {
            legs.iter().fold(Decimal::ZERO, |sum, (quantity, entry)| {
                sum.saturating_add(entry.inner().saturating_mul(*quantity / total))
            })
        });
        Some(Price::new(weighted))
    }

    /// Shared mark price of both legs.
    pub fn mark_price(&self) -> Option<Price> {
        self.long.mark_price()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn set_mark_price(&mut self, price: Price) {
        self.long.set_mark_price(price);
        self.short.set_mark_price(price);
    }

    /// Pick the leg for a fill without touching any state.
    pub fn route(&self, fill: &Fill) -> PositionResult<Route> {
        match fill.position_side {
            Some(side) => {
                let direction = side.direction().ok_or_else(|| {
                    PositionError::InvalidDirection(format!(
                        "{} fill targets {} in hedge mode",
                        self.key, side
                    ))
                })?;
                Ok(Route {
                    direction,
                    inferred: false,
                })
            }
            None => Ok(Route {
                direction: self.infer_direction(fill.action),
                inferred: true,
            }),
        }
    }

    fn infer_direction(&self, action: OrderAction) -> Direction {
        match (self.routing, action) {
            (RoutingPolicy::ActionSide, action) => Direction::from_action(action),
            (RoutingPolicy::PreferOpenSide, OrderAction::Buy) => {
                if self.long.is_open() || self.short.is_close() {
                    Direction::Long
                } else {
                    Direction::Short
                }
            }
            (RoutingPolicy::PreferOpenSide, OrderAction::Sell) => {
                if self.short.is_open() || self.long.is_close() {
                    Direction::Short
                } else {
                    Direction::Long
                }
            }
        }
    }

    /// Route a fill and apply it to exactly one leg.
    pub fn apply_fill(&mut self, fill: &Fill) -> PositionResult<(Route, FillOutcome)> {
        let route = self.route(fill)?;
        debug!(
            key = %self.key,
            action = %fill.action,
            quantity = %fill.quantity,
            price = %fill.price,
            target = %route.direction,
            inferred = route.inferred,
            policy = %self.routing,
            "Routing fill"
        );
        let outcome = self.exposure_mut(route.direction).apply_order_fill(fill)?;
        Ok((route, outcome))
    }

    /// Apply stream updates. Both legs are validated before either changes.
    pub fn sync(&mut self, update: &PairSync) -> PositionResult<()> {
        let mut long = self.long.clone();
        let mut short = self.short.clone();
        if let Some(u) = &update.long {
            long.sync(u)?;
        }
        if let Some(u) = &update.short {
            short.sync(u)?;
        }
        self.long = long;
        self.short = short;
        Ok(())
    }

    pub fn snapshot(&self) -> PairSnapshot {
        PairSnapshot {
            venue: self.key.venue.clone(),
            instrument: self.key.instrument.clone(),
            routing: self.routing,
            net_quantity: self.net_quantity(),
            net_direction: self.net_direction_lossy(),
            fully_hedged: self.is_fully_hedged(),
            weighted_entry_price: self.weighted_entry_price(),
            total_realized_pnl: self.total_realized_pnl(),
            total_unrealized_pnl: self.total_unrealized_pnl(),
            total_pnl: self.total_pnl(),
            total_value: self.total_notional_value(),
            long: self.long.snapshot(),
            short: self.short.snapshot(),
        }
    }
}
