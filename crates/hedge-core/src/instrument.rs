//! Venue and instrument identification.
//!
//! A position is always scoped to one instrument on one venue. The
//! registry key is the pair of both, rendered as `{venue}-{instrument}`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Venue (exchange) identifier, e.g. `Binance Perpetual Futures`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(String);

impl VenueId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VenueId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Instrument symbol on a venue, e.g. `BTC-USDT`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Unique key for one tradable instrument on one venue.
///
/// Ordering is venue first, then instrument, which is what snapshot
/// export relies on for deterministic output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstrumentKey {
    pub venue: VenueId,
    pub instrument: InstrumentId,
}

impl InstrumentKey {
    pub fn new(venue: impl Into<VenueId>, instrument: impl Into<InstrumentId>) -> Self {
        Self {
            venue: venue.into(),
            instrument: instrument.into(),
        }
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.venue, self.instrument)
    }
}

/// Futures position mode of a venue.
///
/// Resolved once per venue before the position registry is built and
/// immutable for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PositionMode {
    /// One exposure per instrument; buys and sells net against each other.
    #[default]
    #[serde(rename = "one-way")]
    OneWay,
    /// Independent long and short exposures per instrument.
    #[serde(rename = "hedge")]
    Hedge,
}

impl PositionMode {
    /// Resolve a raw configuration value.
    ///
    /// Only `hedge` (case-insensitive) selects hedge mode; every other
    /// value, including typos, falls back to one-way.
    pub fn resolve(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("hedge") {
            Self::Hedge
        } else {
            Self::OneWay
        }
    }

    /// True if `raw` is one of the two canonical spellings.
    pub fn is_canonical(raw: &str) -> bool {
        matches!(raw, "hedge" | "one-way")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneWay => "one-way",
            Self::Hedge => "hedge",
        }
    }

    pub fn is_hedge(&self) -> bool {
        *self == Self::Hedge
    }
}

impl fmt::Display for PositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = InstrumentKey::new("Sandbox", "BTC-USDT");
        assert_eq!(key.to_string(), "Sandbox-BTC-USDT");
    }

    #[test]
    fn test_key_ordering_is_venue_first() {
        let a = InstrumentKey::new("A", "ZZZ");
        let b = InstrumentKey::new("B", "AAA");
        assert!(a < b);
    }

    #[test]
    fn test_mode_resolution() {
        assert_eq!(PositionMode::resolve("hedge"), PositionMode::Hedge);
        assert_eq!(PositionMode::resolve(" Hedge "), PositionMode::Hedge);
        assert_eq!(PositionMode::resolve("one-way"), PositionMode::OneWay);
        assert_eq!(PositionMode::resolve("hedged"), PositionMode::OneWay);
        assert_eq!(PositionMode::resolve(""), PositionMode::OneWay);
        assert_eq!(PositionMode::default(), PositionMode::OneWay);
    }

    #[test]
    fn test_mode_serde_spelling() {
        let json = serde_json::to_string(&PositionMode::OneWay).unwrap();
        assert_eq!(json, "\"one-way\"");
        let mode: PositionMode = serde_json::from_str("\"hedge\"").unwrap();
        assert!(mode.is_hedge());
    }
}
