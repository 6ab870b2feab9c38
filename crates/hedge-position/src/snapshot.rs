//! Serializable export of position state.
//!
//! Snapshots are plain data. A registry snapshot lists entries sorted by
//! key, so the same state always serializes to the same JSON.

use hedge_core::{Direction, InstrumentId, PositionMode, PositionSide, Price, Quantity, VenueId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::exposure::ExposureState;
use crate::pair::{NetDirection, RoutingPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureSnapshot {
    pub id: Uuid,
    pub venue: VenueId,
    pub instrument: InstrumentId,
    pub side: PositionSide,
    pub direction: Option<Direction>,
    pub quantity: Quantity,
    pub entry_price: Option<Price>,
    pub mark_price: Option<Price>,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub is_open: bool,
    pub is_close: bool,
    pub state: ExposureState,
    pub fill_count: u64,
    pub opened_at_ms: Option<u64>,
    pub last_update_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSnapshot {
    pub venue: VenueId,
    pub instrument: InstrumentId,
    pub routing: RoutingPolicy,
    pub net_quantity: Decimal,
    /// Fully hedged pairs report `flat` here with `fully_hedged = true`.
    pub net_direction: NetDirection,
    pub fully_hedged: bool,
    pub weighted_entry_price: Option<Price>,
    pub total_realized_pnl: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub total_pnl: Decimal,
    /// Both legs valued at the mark price.
    pub total_value: Decimal,
    pub long: ExposureSnapshot,
    pub short: ExposureSnapshot,
}

/// One registry entry, tagged by mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum EntrySnapshot {
    OneWay(ExposureSnapshot),
    Hedge(PairSnapshot),
}

impl EntrySnapshot {
    pub fn mode(&self) -> PositionMode {
        match self {
            Self::OneWay(_) => PositionMode::OneWay,
            Self::Hedge(_) => PositionMode::Hedge,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub generation: u64,
    pub open_instruments: usize,
    pub entries: Vec<EntrySnapshot>,
}
