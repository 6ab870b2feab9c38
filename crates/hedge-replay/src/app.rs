//! Event replay through the position registry.
//!
//! Events are JSON lines applied strictly in file order. The first error
//! stops the replay; nothing is skipped or retried.

use std::path::Path;

use chrono::{DateTime, Utc};
use hedge_core::{Fill, InstrumentKey, MarkPriceUpdate, PositionMode, VenueId};
use hedge_position::{EntrySync, PositionRegistry, PositionResult, PositionView, RegistrySnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Authoritative state for one instrument from an exchange stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    #[serde(flatten)]
    pub key: InstrumentKey,
    pub update: EntrySync,
}

/// Venue announcing its position mode mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeEvent {
    pub venue: VenueId,
    pub futures_position_mode: String,
}

/// One line of an event file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplayEvent {
    Fill(Fill),
    Mark(MarkPriceUpdate),
    Sync(SyncEvent),
    Mode(ModeEvent),
}

/// Counters for a finished replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub fills: u64,
    pub marks: u64,
    pub syncs: u64,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub open_instruments: usize,
}

/// Output printed at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReplaySummary,
    pub snapshot: RegistrySnapshot,
}

/// Owns the registry for one run.
pub struct Replayer {
    registry: PositionRegistry,
    summary: ReplaySummary,
}

impl Replayer {
    /// Build and initialize the registry from configuration.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        let mut registry = PositionRegistry::with_routing(config.routing);
        registry.initialize(&config.venue_ids(), &config.instrument_ids(), &config.modes());

        Ok(Self {
            registry,
            summary: ReplaySummary::default(),
        })
    }

    pub fn registry(&self) -> &PositionRegistry {
        &self.registry
    }

    /// Apply one event.
    pub fn apply(&mut self, event: &ReplayEvent) -> PositionResult<()> {
        match event {
            ReplayEvent::Fill(fill) => {
                self.registry.apply_fill(fill)?;
                self.summary.fills += 1;
            }
            ReplayEvent::Mark(update) => {
                self.registry.apply_mark_price(update)?;
                self.summary.marks += 1;
            }
            ReplayEvent::Sync(sync) => {
                self.registry.sync(&sync.key, sync.update.clone())?;
                self.summary.syncs += 1;
            }
            ReplayEvent::Mode(mode) => {
                let requested = PositionMode::resolve(&mode.futures_position_mode);
                self.registry.ensure_mode(&mode.venue, requested)?;
                debug!(venue = %mode.venue, mode = %requested, "Venue mode confirmed");
            }
        }
        Ok(())
    }

    /// Replay JSON-lines text. Blank lines are ignored.
    pub fn replay_str(&mut self, input: &str) -> AppResult<ReplaySummary> {
        for (index, raw) in input.lines().enumerate() {
            let line = index + 1;
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let event: ReplayEvent = serde_json::from_str(raw).map_err(|e| AppError::Parse {
                line,
                message: e.to_string(),
            })?;
            if let Err(source) = self.apply(&event) {
                warn!(line, error = %source, "Replay aborted");
                return Err(AppError::Event { line, source });
            }
        }
        Ok(self.summary())
    }

    pub fn replay_file(&mut self, path: impl AsRef<Path>) -> AppResult<ReplaySummary> {
        let path = path.as_ref();
        info!(events = %path.display(), "Replaying events");
        let input = std::fs::read_to_string(path)?;
        let summary = self.replay_str(&input)?;
        info!(
            fills = summary.fills,
            marks = summary.marks,
            syncs = summary.syncs,
            realized_pnl = %summary.realized_pnl,
            unrealized_pnl = %summary.unrealized_pnl,
            open_instruments = summary.open_instruments,
            "Replay complete"
        );
        Ok(summary)
    }

    /// Counters plus PnL totals across every entry.
    pub fn summary(&self) -> ReplaySummary {
        let mut summary = self.summary.clone();
        summary.realized_pnl = Decimal::ZERO;
        summary.unrealized_pnl = Decimal::ZERO;
        for key in self.registry.keys() {
            if let Ok(entry) = self.registry.lookup(&key) {
                summary.realized_pnl = summary.realized_pnl.saturating_add(entry.realized_pnl());
                summary.unrealized_pnl =
                    summary.unrealized_pnl.saturating_add(entry.unrealized_pnl());
            }
        }
        summary.open_instruments = self.registry.count_instruments_with_open_exposure();
        summary
    }

    pub fn report(&self) -> ReplayReport {
        ReplayReport {
            generated_at: Utc::now(),
            summary: self.summary(),
            snapshot: self.registry.snapshot(),
        }
    }
}
