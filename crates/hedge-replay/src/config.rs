//! Application configuration.

use crate::error::{AppError, AppResult};
use hedge_core::{InstrumentId, PositionMode, VenueId};
use hedge_position::RoutingPolicy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "HEDGE_CONFIG";

/// Config file used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Market type of a venue. Only futures venues can run hedge mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    #[default]
    Futures,
    Spot,
}

/// One venue entry (`[[venues]]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: VenueKind,
    /// `hedge` or `one-way`. Kept as written; anything but `hedge` runs one-way.
    #[serde(default = "default_futures_position_mode")]
    pub futures_position_mode: String,
}

fn default_futures_position_mode() -> String {
    PositionMode::OneWay.as_str().to_string()
}

impl VenueConfig {
    /// Mode this venue's instruments are built with.
    pub fn position_mode(&self) -> PositionMode {
        match self.kind {
            VenueKind::Spot => PositionMode::OneWay,
            VenueKind::Futures => {
                if !PositionMode::is_canonical(&self.futures_position_mode) {
                    warn!(
                        venue = %self.name,
                        futures_position_mode = %self.futures_position_mode,
                        "Unrecognized position mode, using one-way"
                    );
                }
                PositionMode::resolve(&self.futures_position_mode)
            }
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info,hedge=debug".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// A futures venue whose mode was rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub venue: String,
    pub from: String,
    pub to: PositionMode,
}

/// Application configuration.
///
/// Plain keys come before `[[venues]]` and `[telemetry]` so the struct
/// serializes back to valid TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Instrument symbols traded on every venue.
    pub instruments: Vec<String>,
    /// Leg selection for fills without a target side.
    #[serde(default)]
    pub routing: RoutingPolicy,
    pub venues: Vec<VenueConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.venues.is_empty() {
            return Err(AppError::Config("At least one venue is required".to_string()));
        }
        if self.instruments.is_empty() {
            return Err(AppError::Config("At least one instrument is required".to_string()));
        }
        let mut seen = HashSet::new();
        for venue in &self.venues {
            if venue.name.trim().is_empty() {
                return Err(AppError::Config("Venue name must not be empty".to_string()));
            }
            if !seen.insert(venue.name.as_str()) {
                return Err(AppError::Config(format!("Duplicate venue: {}", venue.name)));
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|e| AppError::Serialize(e.to_string()))
    }

    /// Write the configuration back to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> AppResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn venue_ids(&self) -> Vec<VenueId> {
        self.venues.iter().map(|v| VenueId::new(v.name.as_str())).collect()
    }

    pub fn instrument_ids(&self) -> Vec<InstrumentId> {
        self.instruments
            .iter()
            .map(|s| InstrumentId::new(s.as_str()))
            .collect()
    }

    /// Resolved mode per venue.
    pub fn modes(&self) -> HashMap<VenueId, PositionMode> {
        self.venues
            .iter()
            .map(|v| (VenueId::new(v.name.as_str()), v.position_mode()))
            .collect()
    }

    /// Set `futures_position_mode` on every futures venue.
    ///
    /// Spot venues are left alone. Returns the venues whose value changed.
    pub fn set_futures_position_mode(&mut self, mode: PositionMode) -> Vec<ModeChange> {
        let mut changes = Vec::new();
        for venue in self.venues.iter_mut().filter(|v| v.kind == VenueKind::Futures) {
            if venue.futures_position_mode == mode.as_str() {
                continue;
            }
            let from = std::mem::replace(&mut venue.futures_position_mode, mode.as_str().to_string());
            changes.push(ModeChange {
                venue: venue.name.clone(),
                from,
                to: mode,
            });
        }
        changes
    }
}

/// Config path: CLI argument, then `HEDGE_CONFIG`, then the default.
pub fn resolve_config_path(cli: Option<String>) -> String {
    cli.or_else(|| std::env::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
instruments = ["BTC-USDT", "ETH-USDT"]

[[venues]]
name = "Binance Perpetual Futures"
type = "futures"
futures_position_mode = "hedge"

[[venues]]
name = "Bybit USDT Perpetual"
type = "futures"

[[venues]]
name = "Binance Spot"
type = "spot"
futures_position_mode = "hedge"
"#;

    #[test]
    fn test_defaults_and_modes() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.routing, RoutingPolicy::PreferOpenSide);
        assert_eq!(config.telemetry.log_level, "info,hedge=debug");

        let modes = config.modes();
        assert_eq!(modes[&VenueId::new("Binance Perpetual Futures")], PositionMode::Hedge);
        assert_eq!(modes[&VenueId::new("Bybit USDT Perpetual")], PositionMode::OneWay);
        // spot never hedges
        assert_eq!(modes[&VenueId::new("Binance Spot")], PositionMode::OneWay);
    }

    #[test]
    fn test_unknown_mode_string_runs_one_way() {
        let venue = VenueConfig {
            name: "X".to_string(),
            kind: VenueKind::Futures,
            futures_position_mode: "cross".to_string(),
        };
        assert_eq!(venue.position_mode(), PositionMode::OneWay);
    }

    #[test]
    fn test_validation() {
        assert!(AppConfig::from_toml("instruments = []\nvenues = []").is_err());

        let duplicate = r#"
instruments = ["BTC-USDT"]
[[venues]]
name = "A"
[[venues]]
name = "A"
"#;
        let err = AppConfig::from_toml(duplicate).unwrap_err();
        assert!(err.to_string().contains("Duplicate venue"));
    }

    #[test]
    fn test_set_futures_position_mode() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        let changes = config.set_futures_position_mode(PositionMode::Hedge);

        assert_eq!(
            changes,
            vec![ModeChange {
                venue: "Bybit USDT Perpetual".to_string(),
                from: "one-way".to_string(),
                to: PositionMode::Hedge,
            }]
        );
        assert!(config.set_futures_position_mode(PositionMode::Hedge).is_empty());

        let changes = config.set_futures_position_mode(PositionMode::OneWay);
        assert_eq!(changes.len(), 2);
        assert_eq!(config.venues[2].futures_position_mode, "hedge");
    }

    #[test]
    fn test_toml_roundtrip_keeps_modes() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        config.set_futures_position_mode(PositionMode::Hedge);

        let text = config.to_toml().unwrap();
        let back = AppConfig::from_toml(&text).unwrap();
        assert_eq!(back.modes(), config.modes());
        assert_eq!(back.instruments, config.instruments);
    }

    #[test]
    fn test_cli_path_wins() {
        assert_eq!(resolve_config_path(Some("a.toml".to_string())), "a.toml");
    }
}
