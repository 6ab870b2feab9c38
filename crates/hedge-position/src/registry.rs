//! Process-wide position registry.
//!
//! Maps every configured `(venue, instrument)` to a bare one-way
//! [`Exposure`] or a hedge-mode [`ExposurePair`]. The mode is fixed per
//! venue when the registry is built. Each entry sits behind its own
//! mutex so readers on other threads never see a half-applied fill.

use std::collections::HashMap;

use hedge_core::{Fill, InstrumentId, InstrumentKey, MarkPriceUpdate, PositionMode, VenueId};
use hedge_telemetry::Metrics;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PositionError, PositionResult};
use crate::exposure::{Exposure, ExposureSync, FillOutcome};
use crate::pair::{ExposurePair, PairSync, RoutingPolicy};
use crate::snapshot::{EntrySnapshot, RegistrySnapshot};
use crate::view::PositionView;

// ============================================================================
// RegistryEntry
// ============================================================================

/// Position state of one instrument.
#[derive(Debug, Clone)]
pub enum RegistryEntry {
    OneWay(Exposure),
    Hedge(ExposurePair),
}

/// Authoritative update for one entry; must match the entry's mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum EntrySync {
    Hedge(PairSync),
    OneWay(ExposureSync),
}

impl From<PairSync> for EntrySync {
    fn from(update: PairSync) -> Self {
        Self::Hedge(update)
    }
}

impl From<ExposureSync> for EntrySync {
    fn from(update: ExposureSync) -> Self {
        Self::OneWay(update)
    }
}

impl RegistryEntry {
    pub fn new(key: InstrumentKey, mode: PositionMode, routing: RoutingPolicy) -> Self {
        match mode {
            PositionMode::Hedge => Self::Hedge(ExposurePair::with_routing(key, routing)),
            PositionMode::OneWay => Self::OneWay(Exposure::one_way(key)),
        }
    }

    pub fn mode(&self) -> PositionMode {
        match self {
            Self::OneWay(_) => PositionMode::OneWay,
            Self::Hedge(_) => PositionMode::Hedge,
        }
    }

    pub fn as_exposure(&self) -> Option<&Exposure> {
        match self {
            Self::OneWay(exposure) => Some(exposure),
            Self::Hedge(_) => None,
        }
    }

    pub fn as_pair(&self) -> Option<&ExposurePair> {
        match self {
            Self::Hedge(pair) => Some(pair),
            Self::OneWay(_) => None,
        }
    }

    /// Read facade over whichever variant is stored.
    pub fn view(&self) -> &dyn PositionView {
        match self {
            Self::OneWay(exposure) => exposure,
            Self::Hedge(pair) => pair,
        }
    }

    /// `is_open` for a bare exposure, `is_open_any` for a pair.
    pub fn has_open_exposure(&self) -> bool {
        match self {
            Self::OneWay(exposure) => exposure.is_open(),
            Self::Hedge(pair) => pair.is_open_any(),
        }
    }

    /// Apply a fill and return the route label used for metrics.
    pub fn apply_fill(&mut self, fill: &Fill) -> PositionResult<(&'static str, FillOutcome)> {
        match self {
            Self::OneWay(exposure) => {
                if let Some(side) = fill.position_side {
                    if side.direction().is_some() {
                        debug!(
                            key = %fill.key,
                            side = %side,
                            "Ignoring target side on one-way instrument"
                        );
                    }
                }
                let outcome = exposure.apply_order_fill(fill)?;
                Ok(("one_way", outcome))
            }
            Self::Hedge(pair) => {
                let (route, outcome) = pair.apply_fill(fill)?;
                Ok((route.label(), outcome))
            }
        }
    }

    pub fn set_mark_price(&mut self, update: &MarkPriceUpdate) {
        match self {
            Self::OneWay(exposure) => exposure.set_mark_price(update.price),
            Self::Hedge(pair) => pair.set_mark_price(update.price),
        }
    }

    pub fn sync(&mut self, update: &EntrySync) -> PositionResult<()> {
        match (self, update) {
            (Self::OneWay(exposure), EntrySync::OneWay(u)) => exposure.sync(u),
            (Self::Hedge(pair), EntrySync::Hedge(u)) => pair.sync(u),
            (entry, _) => Err(PositionError::ModeMismatch {
                key: entry.view().key().clone(),
                mode: entry.mode(),
            }),
        }
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        match self {
            Self::OneWay(exposure) => EntrySnapshot::OneWay(exposure.snapshot()),
            Self::Hedge(pair) => EntrySnapshot::Hedge(pair.snapshot()),
        }
    }

    fn publish(&self) {
        let key = self.view().key();
        Metrics::exposure_state(
            key.venue.as_str(),
            key.instrument.as_str(),
            to_gauge(self.view().quantity()),
            to_gauge(self.view().realized_pnl()),
            to_gauge(self.view().unrealized_pnl()),
        );
    }
}

fn to_gauge(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

// ============================================================================
// PositionRegistry
// ============================================================================

/// Registry of every configured instrument's position state.
///
/// Build it with [`PositionRegistry::initialize`] before any fill is
/// delivered. Fill delivery and reads take `&self`; rebuilding takes
/// `&mut self`.
#[derive(Debug, Default)]
pub struct PositionRegistry {
    entries: HashMap<InstrumentKey, Mutex<RegistryEntry>>,
    venues: Vec<VenueId>,
    instruments: Vec<InstrumentId>,
    modes: HashMap<VenueId, PositionMode>,
    routing: RoutingPolicy,
    generation: u64,
}

impl PositionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose hedge entries route directionless fills with `routing`.
    pub fn with_routing(routing: RoutingPolicy) -> Self {
        Self {
            routing,
            ..Self::default()
        }
    }

    /// Build one entry per venue × instrument.
    ///
    /// Venues missing from `modes` run one-way. Calling this again replaces
    /// every entry.
    pub fn initialize(
        &mut self,
        venues: &[VenueId],
        instruments: &[InstrumentId],
        modes: &HashMap<VenueId, PositionMode>,
    ) {
        self.venues = venues.to_vec();
        self.instruments = instruments.to_vec();
        self.modes = venues
            .iter()
            .map(|venue| {
                let mode = modes.get(venue).copied().unwrap_or_default();
                (venue.clone(), mode)
            })
            .collect();
        self.rebuild();

        info!(
            venues = self.venues.len(),
            instruments = self.instruments.len(),
            entries = self.entries.len(),
            hedge_venues = self.modes.values().filter(|m| m.is_hedge()).count(),
            routing = %self.routing,
            generation = self.generation,
            "Position registry initialized"
        );
    }

    /// Rebuild every entry empty, keeping venues, instruments and modes.
    pub fn reset(&mut self) -> PositionResult<()> {
        if !self.is_initialized() {
            return Err(PositionError::NotInitialized);
        }
        self.rebuild();
        debug!(generation = self.generation, "Position registry reset");
        Ok(())
    }

    fn rebuild(&mut self) {
        let mut entries = HashMap::with_capacity(self.venues.len() * self.instruments.len());
        for venue in &self.venues {
            let mode = self.modes.get(venue).copied().unwrap_or_default();
            for instrument in &self.instruments {
                let key = InstrumentKey::new(venue.clone(), instrument.clone());
                let entry = RegistryEntry::new(key.clone(), mode, self.routing);
                entries.insert(key, Mutex::new(entry));
            }
        }
        self.entries = entries;
        self.generation += 1;
        Metrics::open_instruments(0);
    }

    pub fn is_initialized(&self) -> bool {
        self.generation > 0
    }

    /// Number of times the entries have been built.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn routing(&self) -> RoutingPolicy {
        self.routing
    }

    pub fn mode_for(&self, venue: &VenueId) -> Option<PositionMode> {
        self.modes.get(venue).copied()
    }

    /// Check that `venue` still runs in `requested` mode.
    ///
    /// Modes are fixed for the life of the registry; any change is refused.
    pub fn ensure_mode(&self, venue: &VenueId, requested: PositionMode) -> PositionResult<()> {
        if !self.is_initialized() {
            return Err(PositionError::NotInitialized);
        }
        let current = self
            .mode_for(venue)
            .ok_or_else(|| PositionError::UnknownInstrument(venue.to_string()))?;
        if current != requested {
            warn!(
                venue = %venue,
                current = %current,
                requested = %requested,
                "Position mode change rejected after registry construction"
            );
            return Err(PositionError::ModeChangeRejected {
                venue: venue.clone(),
                current,
                requested,
            });
        }
        Ok(())
    }

    /// Lock and return the entry for `key`.
    pub fn lookup(&self, key: &InstrumentKey) -> PositionResult<MutexGuard<'_, RegistryEntry>> {
        if !self.is_initialized() {
            return Err(PositionError::NotInitialized);
        }
        self.entries
            .get(key)
            .map(|entry| entry.lock())
            .ok_or_else(|| PositionError::UnknownInstrument(key.to_string()))
    }

    /// Deliver one fill to its instrument's entry.
    pub fn apply_fill(&self, fill: &Fill) -> PositionResult<FillOutcome> {
        let result = self.lookup(&fill.key).and_then(|mut entry| {
            let applied = entry.apply_fill(fill);
            if applied.is_ok() {
                entry.publish();
            }
            applied
        });

        match result {
            Ok((route, outcome)) => {
                Metrics::fill_applied(
                    fill.key.venue.as_str(),
                    fill.key.instrument.as_str(),
                    outcome.side.as_str(),
                    route,
                );
                Metrics::open_instruments(self.count_instruments_with_open_exposure());
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    key = %fill.key,
                    action = %fill.action,
                    quantity = %fill.quantity,
                    price = %fill.price,
                    error = %e,
                    "Fill rejected"
                );
                Metrics::fill_rejected(
                    fill.key.venue.as_str(),
                    fill.key.instrument.as_str(),
                    e.reason(),
                );
                Err(e)
            }
        }
    }

    pub fn apply_mark_price(&self, update: &MarkPriceUpdate) -> PositionResult<()> {
        let mut entry = self.lookup(&update.key)?;
        entry.set_mark_price(update);
        entry.publish();
        Ok(())
    }

    /// Overwrite an entry from an authoritative exchange stream.
    pub fn sync(&self, key: &InstrumentKey, update: impl Into<EntrySync>) -> PositionResult<()> {
        let update = update.into();
        {
            let mut entry = self.lookup(key)?;
            entry.sync(&update)?;
            entry.publish();
        }
        debug!(key = %key, "Entry synced from stream");
        Metrics::open_instruments(self.count_instruments_with_open_exposure());
        Ok(())
    }

    /// Entries with a bare open exposure or a pair with any open leg.
    pub fn count_instruments_with_open_exposure(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.lock().has_open_exposure())
            .count()
    }

    /// Configured keys in sorted order.
    pub fn keys(&self) -> Vec<InstrumentKey> {
        let mut keys: Vec<_> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export every entry, sorted by key.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let entries: Vec<EntrySnapshot> = self
            .keys()
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|entry| entry.lock().snapshot())
            .collect();
        let open_instruments = self.count_instruments_with_open_exposure();

        RegistrySnapshot {
            generation: self.generation,
            open_instruments,
            entries,
        }
    }
}
