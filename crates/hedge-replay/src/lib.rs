//! Host application for position accounting.
//!
//! Loads configuration, builds the position registry once, and replays
//! recorded fill and mark-price events through it.

pub mod app;
pub mod config;
pub mod error;

pub use app::{ModeEvent, ReplayEvent, ReplayReport, ReplaySummary, Replayer, SyncEvent};
pub use config::{
    resolve_config_path, AppConfig, ModeChange, TelemetryConfig, VenueConfig, VenueKind,
};
pub use error::{AppError, AppResult};
