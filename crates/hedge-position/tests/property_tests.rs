//! Property tests for exposure pair invariants.
//!
//! 1. Net identity: net quantity equals long minus short after every fill
//! 2. Realized additivity: pair realized PnL is the sum of each leg's own
//! 3. Independence: a fill for one leg never changes the other
//! 4. Routing determinism: replaying directionless fills gives the same end state
//! 5. Mark idempotence: repeating a mark price leaves unrealized PnL unchanged

use hedge_core::{Fill, InstrumentKey, OrderAction, PositionSide, Price, Quantity};
use hedge_position::{Exposure, ExposurePair, RoutingPolicy};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ── Strategies ───────────────────────────────────────────────────────

fn key() -> InstrumentKey {
    InstrumentKey::new("Prop", "XYZ-USD")
}

/// Two-decimal quantity in (0, 10].
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (1i64..=1000).prop_map(|q| Decimal::new(q, 2))
}

/// Two-decimal price in [50, 150].
fn arb_price() -> impl Strategy<Value = Decimal> {
    (5000i64..=15000).prop_map(|p| Decimal::new(p, 2))
}

fn arb_action() -> impl Strategy<Value = OrderAction> {
    prop_oneof![Just(OrderAction::Buy), Just(OrderAction::Sell)]
}

fn arb_target() -> impl Strategy<Value = PositionSide> {
    prop_oneof![Just(PositionSide::Long), Just(PositionSide::Short)]
}

fn arb_explicit_fill() -> impl Strategy<Value = Fill> {
    (arb_target(), arb_action(), arb_quantity(), arb_price()).prop_map(|(side, action, q, p)| {
        Fill::new(key(), action, Quantity::new(q), Price::new(p)).targeting(side)
    })
}

fn arb_directionless_fill() -> impl Strategy<Value = Fill> {
    (arb_action(), arb_quantity(), arb_price())
        .prop_map(|(action, q, p)| Fill::new(key(), action, Quantity::new(q), Price::new(p)))
}

fn arb_policy() -> impl Strategy<Value = RoutingPolicy> {
    prop_oneof![
        Just(RoutingPolicy::PreferOpenSide),
        Just(RoutingPolicy::ActionSide)
    ]
}

// ── Invariants ───────────────────────────────────────────────────────

proptest! {
    /// Net quantity identity holds after every accepted or rejected fill.
    #[test]
    fn net_quantity_identity(fills in prop::collection::vec(arb_explicit_fill(), 1..40)) {
        let mut pair = ExposurePair::new(key());
        for fill in &fills {
            let _ = pair.apply_fill(fill);
            prop_assert_eq!(
                pair.net_quantity(),
                pair.long().quantity().inner() - pair.short().quantity().inner()
            );
            prop_assert_eq!(pair.is_open_any(), pair.long().is_open() || pair.short().is_open());
            prop_assert_eq!(pair.is_fully_closed(), pair.long().is_close() && pair.short().is_close());
        }
    }

    /// Pair realized PnL equals two standalone exposures fed the same fills.
    #[test]
    fn realized_pnl_is_additive(fills in prop::collection::vec(arb_explicit_fill(), 1..40)) {
        let mut pair = ExposurePair::new(key());
        let mut long = Exposure::new(key(), PositionSide::Long);
        let mut short = Exposure::new(key(), PositionSide::Short);

        for fill in &fills {
            let paired = pair.apply_fill(fill).is_ok();
            let standalone = match fill.position_side {
                Some(PositionSide::Long) => long.apply_order_fill(fill).is_ok(),
                _ => short.apply_order_fill(fill).is_ok(),
            };
            prop_assert_eq!(paired, standalone);
        }

        prop_assert_eq!(pair.long().realized_pnl(), long.realized_pnl());
        prop_assert_eq!(pair.short().realized_pnl(), short.realized_pnl());
        prop_assert_eq!(pair.total_realized_pnl(), long.realized_pnl() + short.realized_pnl());
    }

    /// A fill addressed to one leg leaves the other leg's snapshot unchanged.
    #[test]
    fn legs_are_independent(
        setup in prop::collection::vec(arb_explicit_fill(), 0..20),
        fill in arb_explicit_fill(),
    ) {
        let mut pair = ExposurePair::new(key());
        for f in &setup {
            let _ = pair.apply_fill(f);
        }
        let other = match fill.position_side {
            Some(PositionSide::Long) => pair.short().snapshot(),
            _ => pair.long().snapshot(),
        };

        let _ = pair.apply_fill(&fill);

        let after = match fill.position_side {
            Some(PositionSide::Long) => pair.short().snapshot(),
            _ => pair.long().snapshot(),
        };
        prop_assert_eq!(after, other);
    }

    /// Replaying the same directionless fills reproduces identical quantities.
    #[test]
    fn routing_is_deterministic(
        policy in arb_policy(),
        fills in prop::collection::vec(arb_directionless_fill(), 1..40),
    ) {
        let run = |fills: &[Fill]| {
            let mut pair = ExposurePair::with_routing(key(), policy);
            let routes: Vec<_> = fills
                .iter()
                .map(|f| pair.apply_fill(f).map(|(route, _)| route).ok())
                .collect();
            (routes, pair.long().quantity(), pair.short().quantity(), pair.total_realized_pnl())
        };
        prop_assert_eq!(run(&fills), run(&fills));
    }

    /// Setting the same mark twice yields identical unrealized PnL.
    #[test]
    fn mark_price_is_idempotent(
        fills in prop::collection::vec(arb_explicit_fill(), 1..20),
        mark in arb_price(),
    ) {
        let mut pair = ExposurePair::new(key());
        for fill in &fills {
            let _ = pair.apply_fill(fill);
        }
        pair.set_mark_price(Price::new(mark));
        let first = (pair.long().unrealized_pnl(), pair.short().unrealized_pnl());
        pair.set_mark_price(Price::new(mark));
        let second = (pair.long().unrealized_pnl(), pair.short().unrealized_pnl());
        prop_assert_eq!(first, second);
        prop_assert_eq!(pair.long().mark_price(), pair.short().mark_price());
    }

    /// Quantities never go negative, whatever order the fills arrive in.
    #[test]
    fn quantities_stay_non_negative(fills in prop::collection::vec(arb_directionless_fill(), 1..40)) {
        let mut pair = ExposurePair::new(key());
        for fill in &fills {
            let _ = pair.apply_fill(fill);
            prop_assert!(pair.long().quantity().inner() >= Decimal::ZERO);
            prop_assert!(pair.short().quantity().inner() >= Decimal::ZERO);
        }
    }
}
