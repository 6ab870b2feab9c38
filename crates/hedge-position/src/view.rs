//! Read-only position facade.
//!
//! Callers written against a single position per instrument read through
//! [`PositionView`] and work unchanged whether the instrument runs in
//! one-way or hedge mode. For a pair the view reports net values.

use hedge_core::{InstrumentKey, PositionMode, Price};
use rust_decimal::Decimal;

use crate::exposure::Exposure;
use crate::pair::{ExposurePair, NetDirection};
use crate::registry::RegistryEntry;

/// Enumerated read surface shared by exposures, pairs and registry entries.
pub trait PositionView {
    fn key(&self) -> &InstrumentKey;

    fn mode(&self) -> PositionMode;

    /// Signed quantity: positive long, negative short, net for a pair.
    fn quantity(&self) -> Decimal;

    /// Entry price; quantity-weighted across open legs for a pair.
    fn entry_price(&self) -> Option<Price>;

    fn mark_price(&self) -> Option<Price>;

    fn realized_pnl(&self) -> Decimal;

    fn unrealized_pnl(&self) -> Decimal;

    fn total_pnl(&self) -> Decimal {
        self.realized_pnl().saturating_add(self.unrealized_pnl())
    }

    fn is_open(&self) -> bool;

    fn is_close(&self) -> bool {
        !self.is_open()
    }

    /// Net direction. A fully hedged pair reads as `Flat`.
    fn position_type(&self) -> NetDirection;

    fn is_long(&self) -> bool {
        self.position_type() == NetDirection::Long
    }

    fn is_short(&self) -> bool {
        self.position_type() == NetDirection::Short
    }
}

impl PositionView for Exposure {
    fn key(&self) -> &InstrumentKey {
        Exposure::key(self)
    }

    fn mode(&self) -> PositionMode {
        match self.side().direction() {
            Some(_) => PositionMode::Hedge,
            None => PositionMode::OneWay,
        }
    }

    fn quantity(&self) -> Decimal {
        self.signed_quantity()
    }

    fn entry_price(&self) -> Option<Price> {
        Exposure::entry_price(self)
    }

    fn mark_price(&self) -> Option<Price> {
        Exposure::mark_price(self)
    }

    fn realized_pnl(&self) -> Decimal {
        Exposure::realized_pnl(self)
    }

    fn unrealized_pnl(&self) -> Decimal {
        Exposure::unrealized_pnl(self)
    }

    fn is_open(&self) -> bool {
        Exposure::is_open(self)
    }

    fn position_type(&self) -> NetDirection {
        match self.direction() {
            Some(d) if Exposure::is_open(self) => d.into(),
            _ => NetDirection::Flat,
        }
    }
}

impl PositionView for ExposurePair {
    fn key(&self) -> &InstrumentKey {
        ExposurePair::key(self)
    }

    fn mode(&self) -> PositionMode {
        PositionMode::Hedge
    }

    fn quantity(&self) -> Decimal {
        self.net_quantity()
    }

    fn entry_price(&self) -> Option<Price> {
        self.weighted_entry_price()
    }

    fn mark_price(&self) -> Option<Price> {
        ExposurePair::mark_price(self)
    }

    fn realized_pnl(&self) -> Decimal {
        self.total_realized_pnl()
    }

    fn unrealized_pnl(&self) -> Decimal {
        self.total_unrealized_pnl()
    }

    fn is_open(&self) -> bool {
        self.is_open_any()
    }

    fn position_type(&self) -> NetDirection {
        self.net_direction_lossy()
    }
}

impl PositionView for RegistryEntry {
    fn key(&self) -> &InstrumentKey {
        self.view().key()
    }

    fn mode(&self) -> PositionMode {
        RegistryEntry::mode(self)
    }

    fn quantity(&self) -> Decimal {
        self.view().quantity()
    }

    fn entry_price(&self) -> Option<Price> {
        self.view().entry_price()
    }

    fn mark_price(&self) -> Option<Price> {
        self.view().mark_price()
    }

    fn realized_pnl(&self) -> Decimal {
        self.view().realized_pnl()
    }

    fn unrealized_pnl(&self) -> Decimal {
        self.view().unrealized_pnl()
    }

    fn is_open(&self) -> bool {
        self.view().is_open()
    }

    fn position_type(&self) -> NetDirection {
        self.view().position_type()
    }
}
