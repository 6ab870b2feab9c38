//! Prometheus metrics for position accounting.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`: a failure means duplicate metric
//! names, which is a programming error and should crash at first use.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_int_gauge, CounterVec, GaugeVec, IntGauge,
};

/// Fills applied to an exposure.
/// Labels: route (explicit/inferred/one_way)
pub static FILLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_fills_total",
        "Total fills applied to an exposure",
        &["venue", "instrument", "side", "route"]
    )
    .unwrap()
});

/// Fills rejected before touching any exposure.
pub static FILLS_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_fills_rejected_total",
        "Total fills rejected by position accounting",
        &["venue", "instrument", "reason"]
    )
    .unwrap()
});

/// Instruments with at least one open exposure.
pub static OPEN_INSTRUMENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "hedge_open_instruments",
        "Number of instruments with any open exposure"
    )
    .unwrap()
});

/// Net quantity (long - short) per instrument.
pub static NET_QUANTITY: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "hedge_net_quantity",
        "Net quantity per instrument (long minus short)",
        &["venue", "instrument"]
    )
    .unwrap()
});

pub static REALIZED_PNL: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "hedge_realized_pnl",
        "Realized PnL per instrument, both legs combined",
        &["venue", "instrument"]
    )
    .unwrap()
});

pub static UNREALIZED_PNL: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "hedge_unrealized_pnl",
        "Unrealized PnL per instrument at the last mark price",
        &["venue", "instrument"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a fill applied to an exposure.
    pub fn fill_applied(venue: &str, instrument: &str, side: &str, route: &str) {
        FILLS_TOTAL
            .with_label_values(&[venue, instrument, side, route])
            .inc();
    }

    /// Record a rejected fill.
    pub fn fill_rejected(venue: &str, instrument: &str, reason: &str) {
        FILLS_REJECTED_TOTAL
            .with_label_values(&[venue, instrument, reason])
            .inc();
    }

    pub fn open_instruments(count: usize) {
        OPEN_INSTRUMENTS.set(count as i64);
    }

    /// Publish the aggregate view of one instrument.
    pub fn exposure_state(venue: &str, instrument: &str, net_qty: f64, realized: f64, unrealized: f64) {
        NET_QUANTITY
            .with_label_values(&[venue, instrument])
            .set(net_qty);
        REALIZED_PNL
            .with_label_values(&[venue, instrument])
            .set(realized);
        UNREALIZED_PNL
            .with_label_values(&[venue, instrument])
            .set(unrealized);
    }
}
