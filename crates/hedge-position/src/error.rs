//! Position error types.

use hedge_core::{CoreError, InstrumentKey, PositionMode, PositionSide, Quantity, VenueId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PositionError {
    /// A direction other than `long` / `short` / absent was addressed.
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    /// Reducing fill larger than the addressed exposure.
    ///
    /// Points at a bug in the matching engine; never clamped.
    #[error("Over-close on {key} {side}: requested {requested}, available {available}")]
    OverClose {
        key: InstrumentKey,
        side: PositionSide,
        requested: Quantity,
        available: Quantity,
    },

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Both legs open with exactly zero net quantity.
    #[error("Ambiguous net direction on {key}: fully hedged at {quantity} per side")]
    AmbiguousNetDirection { key: InstrumentKey, quantity: Quantity },

    /// Reduce-only fill whose action would grow the addressed exposure.
    #[error("Reduce-only {action} fill would increase {side} exposure on {key}")]
    ReduceMismatch {
        key: InstrumentKey,
        side: PositionSide,
        action: String,
    },

    #[error("Invalid fill: {0}")]
    InvalidFill(#[from] CoreError),

    /// Position mode changes after the registry has been built.
    #[error("Position mode for {venue} is {current}; refusing change to {requested} mid-run")]
    ModeChangeRejected {
        venue: VenueId,
        current: PositionMode,
        requested: PositionMode,
    },

    /// Sync update shaped for the other position mode.
    #[error("{key} is in {mode} mode; sync update is for the other mode")]
    ModeMismatch { key: InstrumentKey, mode: PositionMode },

    #[error("Position registry not initialized")]
    NotInitialized,
}

impl PositionError {
    /// False only for the informational fully-hedged case.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AmbiguousNetDirection { .. })
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidDirection(_) => "invalid_direction",
            Self::OverClose { .. } => "over_close",
            Self::UnknownInstrument(_) => "unknown_instrument",
            Self::AmbiguousNetDirection { .. } => "ambiguous_net_direction",
            Self::ReduceMismatch { .. } => "reduce_mismatch",
            Self::InvalidFill(_) => "invalid_fill",
            Self::ModeChangeRejected { .. } => "mode_change_rejected",
            Self::ModeMismatch { .. } => "mode_mismatch",
            Self::NotInitialized => "not_initialized",
        }
    }
}

pub type PositionResult<T> = Result<T, PositionError>;
