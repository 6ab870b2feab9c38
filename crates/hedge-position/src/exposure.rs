//! Single directional exposure record.
//!
//! An [`Exposure`] is one leg of position accounting: a quantity magnitude,
//! an entry price, the last mark price and a realized PnL accumulator.
//! The direction never lives in the sign of the quantity. Hedge legs carry
//! a fixed `long` / `short` tag; the one-way exposure (`PositionSide::None`)
//! remembers the direction it was last opened in.
//!
//! Exposures are never removed: returning to zero quantity means closed.

use hedge_core::{CoreError, Direction, Fill, InstrumentKey, PositionSide, Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::error::{PositionError, PositionResult};
use crate::snapshot::ExposureSnapshot;

// ============================================================================
// ExposureState
// ============================================================================

/// Lifecycle state of one exposure within a trading cycle.
///
/// `Flat` is both the initial and the terminal state. Only fills move an
/// exposure between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureState {
    #[default]
    Flat,
    /// Opened by a single fill this cycle.
    PartiallyOpen,
    /// Added to after opening.
    Open,
    /// Reduced, but not to zero.
    PartiallyClosing,
}

impl ExposureState {
    fn after_increase(self) -> Self {
        match self {
            Self::Flat => Self::PartiallyOpen,
            Self::PartiallyOpen | Self::Open | Self::PartiallyClosing => Self::Open,
        }
    }

    fn after_reduce(self, remaining: Quantity) -> Self {
        if remaining.is_zero() {
            Self::Flat
        } else {
            Self::PartiallyClosing
        }
    }
}

// ============================================================================
// FillOutcome
// ============================================================================

/// What a fill did to the exposure it was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillKind {
    /// Flat to non-zero.
    Open,
    Increase,
    Reduce,
    /// Reduced to exactly zero.
    Close,
    /// One-way only: closed and reopened in the opposite direction.
    Flip,
}

/// Result of applying one fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillOutcome {
    pub exposure_id: Uuid,
    pub side: PositionSide,
    /// Direction the fill was applied in (the new direction for a flip).
    pub direction: Direction,
    pub kind: FillKind,
    pub previous_quantity: Quantity,
    pub quantity: Quantity,
    /// Realized PnL produced by this fill alone.
    pub realized_pnl: Decimal,
    pub state: ExposureState,
}

/// Authoritative exposure state pushed by an exchange stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureSync {
    pub quantity: Quantity,
    #[serde(default)]
    pub entry_price: Option<Price>,
    /// Required for a non-zero one-way exposure; must match a hedge leg's tag.
    #[serde(default)]
    pub direction: Option<Direction>,
}

// ============================================================================
// Exposure
// ============================================================================

/// One directional position record for an instrument.
#[derive(Debug, Clone)]
pub struct Exposure {
    id: Uuid,
    key: InstrumentKey,
    side: PositionSide,
    /// Direction currently held by a one-way exposure.
    held: Option<Direction>,
    quantity: Quantity,
    entry_price: Option<Price>,
    mark_price: Option<Price>,
    realized_pnl: Decimal,
    state: ExposureState,
    fill_count: u64,
    opened_at_ms: Option<u64>,
    last_update_ms: u64,
}

impl Exposure {
    /// Create an empty exposure with the given tag.
    #[must_use]
    pub fn new(key: InstrumentKey, side: PositionSide) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            side,
            held: None,
            quantity: Quantity::ZERO,
            entry_price: None,
            mark_price: None,
            realized_pnl: Decimal::ZERO,
            state: ExposureState::Flat,
            fill_count: 0,
            opened_at_ms: None,
            last_update_ms: 0,
        }
    }

    /// Create the single exposure used in one-way mode.
    #[must_use]
    pub fn one_way(key: InstrumentKey) -> Self {
        Self::new(key, PositionSide::None)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> &InstrumentKey {
        &self.key
    }

    pub fn side(&self) -> PositionSide {
        self.side
    }

    /// Direction of the exposure: the fixed tag for hedge legs, the held
    /// direction for one-way, `None` for a flat one-way exposure.
    pub fn direction(&self) -> Option<Direction> {
        self.side.direction().or(self.held)
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Quantity with the direction applied (+ long, - short).
    pub fn signed_quantity(&self) -> Decimal {
        self.direction()
            .map(|d| self.quantity.inner() * d.sign())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn entry_price(&self) -> Option<Price> {
        self.entry_price
    }

    pub fn mark_price(&self) -> Option<Price> {
        self.mark_price
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// `(mark - entry) * quantity * sign`, zero while closed or unpriced.
    pub fn unrealized_pnl(&self) -> Decimal {
        if !self.is_open() {
            return Decimal::ZERO;
        }
        match (self.direction(), self.entry_price, self.mark_price) {
            (Some(direction), Some(entry), Some(mark)) => mark
                .inner()
                .saturating_sub(entry.inner())
                .saturating_mul(self.quantity.inner())
                .saturating_mul(direction.sign()),
            _ => Decimal::ZERO,
        }
    }

    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl.saturating_add(self.unrealized_pnl())
    }

    /// Quantity valued at the mark price (zero before the first mark).
    pub fn notional_value(&self) -> Decimal {
        self.mark_price
            .map(|mark| self.quantity.inner().saturating_mul(mark.inner()))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn is_open(&self) -> bool {
        self.quantity.is_positive()
    }

    pub fn is_close(&self) -> bool {
        self.quantity.is_zero()
    }

    pub fn state(&self) -> ExposureState {
        self.state
    }

    pub fn fill_count(&self) -> u64 {
        self.fill_count
    }

    pub fn opened_at_ms(&self) -> Option<u64> {
        self.opened_at_ms
    }

    pub fn last_update_ms(&self) -> u64 {
        self.last_update_ms
    }

    /// Update the price used for unrealized PnL. No other side effect.
    pub fn set_mark_price(&mut self, price: Price) {
        self.mark_price = Some(price);
    }

    /// Apply a quantity change at `fill_price`.
    ///
    /// Increasing fills re-weight the entry price; reducing fills keep it
    /// and realize `delta * (fill_price - entry) * sign`. A reducing fill
    /// larger than the current quantity fails with `OverClose` and leaves
    /// the exposure untouched.
    pub fn apply_fill(
        &mut self,
        quantity_delta: Quantity,
        fill_price: Price,
        is_reducing: bool,
    ) -> PositionResult<FillOutcome> {
        let outcome = self.apply_delta(quantity_delta, fill_price, is_reducing)?;
        self.fill_count += 1;
        Ok(outcome)
    }

    /// Apply an order fill that has already been routed to this exposure.
    ///
    /// Whether the fill reduces is decided by its action relative to the
    /// exposure direction (sell reduces long, buy reduces short). A
    /// reduce-only fill that would grow the exposure is rejected.
    pub fn apply_order_fill(&mut self, fill: &Fill) -> PositionResult<FillOutcome> {
        fill.validate()?;

        let outcome = match self.side.direction() {
            Some(direction) => {
                let reducing = fill.action == direction.closing_action();
                if fill.is_reducing && !reducing {
                    return Err(self.reduce_mismatch(fill));
                }
                self.apply_delta(fill.quantity, fill.price, reducing)?
            }
            None => self.apply_one_way(fill)?,
        };

        self.fill_count += 1;
        self.last_update_ms = fill.timestamp_ms;
        if matches!(outcome.kind, FillKind::Open | FillKind::Flip) {
            self.opened_at_ms = Some(fill.timestamp_ms);
        }

        trace!(
            key = %self.key,
            side = %self.side,
            kind = ?outcome.kind,
            quantity = %outcome.quantity,
            state = ?outcome.state,
            "Fill applied"
        );
        Ok(outcome)
    }

    /// Overwrite quantity and entry from an authoritative source.
    ///
    /// Realized PnL and fill history are untouched.
    pub fn sync(&mut self, update: &ExposureSync) -> PositionResult<()> {
        let direction = match (self.side.direction(), update.direction) {
            (Some(tag), Some(given)) if tag != given => {
                return Err(PositionError::InvalidDirection(format!(
                    "{} sync for {} leg carries direction {}",
                    self.key, self.side, given
                )));
            }
            (Some(tag), _) => Some(tag),
            (None, given) => given,
        };
        if update.quantity.is_positive() && direction.is_none() {
            return Err(PositionError::InvalidDirection(format!(
                "{} one-way sync needs a direction for quantity {}",
                self.key, update.quantity
            )));
        }
        Quantity::try_magnitude(update.quantity.inner())?;

        self.quantity = update.quantity;
        if update.entry_price.is_some() {
            self.entry_price = update.entry_price;
        }
        if self.quantity.is_zero() {
            self.state = ExposureState::Flat;
            self.opened_at_ms = None;
            if self.side == PositionSide::None {
                self.held = None;
            }
        } else {
            self.state = ExposureState::Open;
            if self.side == PositionSide::None {
                self.held = direction;
            }
        }
        Ok(())
    }

    /// Export every recorded field.
    pub fn snapshot(&self) -> ExposureSnapshot {
        ExposureSnapshot {
            id: self.id,
            venue: self.key.venue.clone(),
            instrument: self.key.instrument.clone(),
            side: self.side,
            direction: self.direction(),
            quantity: self.quantity,
            entry_price: self.entry_price,
            mark_price: self.mark_price,
            realized_pnl: self.realized_pnl,
            unrealized_pnl: self.unrealized_pnl(),
            is_open: self.is_open(),
            is_close: self.is_close(),
            state: self.state,
            fill_count: self.fill_count,
            opened_at_ms: self.opened_at_ms,
            last_update_ms: self.last_update_ms,
        }
    }

    fn apply_delta(
        &mut self,
        delta: Quantity,
        price: Price,
        is_reducing: bool,
    ) -> PositionResult<FillOutcome> {
        if !delta.is_positive() {
            let reason = format!("fill delta must be positive, got {delta}");
            return Err(CoreError::InvalidQuantity(reason).into());
        }
        if !price.is_positive() {
            let reason = format!("fill price must be positive, got {price}");
            return Err(CoreError::InvalidPrice(reason).into());
        }

        if is_reducing {
            return self.reduce(delta, price);
        }
        let direction = self.direction().ok_or_else(|| {
            PositionError::InvalidDirection(format!(
                "{} one-way exposure is flat; open it with an order fill",
                self.key
            ))
        })?;
        self.increase(direction, delta, price)
    }

    /// One-way netting: same direction grows, opposite direction shrinks,
    /// and an opposite non-reducing fill larger than the position flips it.
    fn apply_one_way(&mut self, fill: &Fill) -> PositionResult<FillOutcome> {
        let fill_direction = Direction::from_action(fill.action);

        match self.held {
            Some(held) if held != fill_direction => {
                if fill.quantity <= self.quantity || fill.is_reducing {
                    return self.reduce(fill.quantity, fill.price);
                }
                let previous = self.quantity;
                let closed = self.reduce(previous, fill.price)?;
                // Reopening from flat takes the fill price as entry and cannot overflow.
                let opened = self.increase(fill_direction, fill.quantity - previous, fill.price)?;
                Ok(FillOutcome {
                    kind: FillKind::Flip,
                    previous_quantity: previous,
                    realized_pnl: closed.realized_pnl,
                    ..opened
                })
            }
            Some(_) if fill.is_reducing => Err(self.reduce_mismatch(fill)),
            None if fill.is_reducing => Err(self.over_close(fill.quantity)),
            _ => self.increase(fill_direction, fill.quantity, fill.price),
        }
    }

    fn increase(
        &mut self,
        direction: Direction,
        delta: Quantity,
        price: Price,
    ) -> PositionResult<FillOutcome> {
        let previous = self.quantity;
        let quantity = previous.checked_add(delta)?;

        // (old_qty * old_entry + delta * price) / (old_qty + delta)
        let entry = match self.entry_price {
            Some(entry) if previous.is_positive() => previous
                .checked_notional(entry)?
                .checked_add(delta.checked_notional(price)?)
                .and_then(|weighted| weighted.checked_div(quantity.inner()))
                .ok_or_else(|| {
                    CoreError::Overflow(format!(
                        "{} entry price for {previous} @ {entry} + {delta} @ {price}",
                        self.key
                    ))
                })?,
            _ => price.inner(),
        };

        self.entry_price = Some(Price::new(entry));
        self.quantity = quantity;
        if self.side == PositionSide::None {
            self.held = Some(direction);
        }
        self.state = self.state.after_increase();

        Ok(FillOutcome {
            exposure_id: self.id,
            side: self.side,
            direction,
            kind: if previous.is_zero() {
                FillKind::Open
            } else {
                FillKind::Increase
            },
            previous_quantity: previous,
            quantity,
            realized_pnl: Decimal::ZERO,
            state: self.state,
        })
    }

    fn reduce(&mut self, delta: Quantity, price: Price) -> PositionResult<FillOutcome> {
        let remaining = self
            .quantity
            .checked_sub(delta)
            .ok_or_else(|| self.over_close(delta))?;
        let direction = self.direction().ok_or_else(|| self.over_close(delta))?;
        let entry = self.entry_price.unwrap_or(price);

        let realized = price
            .inner()
            .checked_sub(entry.inner())
            .and_then(|diff| diff.checked_mul(delta.inner()))
            .map(|pnl| pnl * direction.sign());
        let total = realized.and_then(|pnl| self.realized_pnl.checked_add(pnl));
        let (Some(realized), Some(total)) = (realized, total) else {
            let reason = format!("{} realized PnL for {delta} @ {price} from {entry}", self.key);
            return Err(CoreError::Overflow(reason).into());
        };
        let previous = self.quantity;

        self.realized_pnl = total;
        self.quantity = remaining;
        self.state = self.state.after_reduce(remaining);

        let kind = if remaining.is_zero() {
            self.opened_at_ms = None;
            if self.side == PositionSide::None {
                self.held = None;
            }
            FillKind::Close
        } else {
            FillKind::Reduce
        };

        Ok(FillOutcome {
            exposure_id: self.id,
            side: self.side,
            direction,
            kind,
            previous_quantity: previous,
            quantity: remaining,
            realized_pnl: realized,
            state: self.state,
        })
    }

    fn over_close(&self, requested: Quantity) -> PositionError {
        PositionError::OverClose {
            key: self.key.clone(),
            side: self.side,
            requested,
            available: self.quantity,
        }
    }

    fn reduce_mismatch(&self, fill: &Fill) -> PositionError {
        PositionError::ReduceMismatch {
            key: self.key.clone(),
            side: self.side,
            action: fill.action.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_core::OrderAction;
    use rust_decimal_macros::dec;

    fn key() -> InstrumentKey {
        InstrumentKey::new("Sandbox", "BTC-USDT")
    }

    fn qty(d: Decimal) -> Quantity {
        Quantity::new(d)
    }

    /// `multiple * 10^27`, close to the top of the `Decimal` range.
    fn huge(multiple: i128) -> Quantity {
        Quantity::new(Decimal::from_i128_with_scale(multiple * 10_i128.pow(27), 0))
    }

    fn px(d: Decimal) -> Price {
        Price::new(d)
    }

    #[test]
    fn test_new_exposure_is_flat() {
        let exposure = Exposure::new(key(), PositionSide::Long);
        assert!(exposure.is_close());
        assert!(!exposure.is_open());
        assert_eq!(exposure.entry_price(), None);
        assert_eq!(exposure.state(), ExposureState::Flat);
        assert_eq!(exposure.unrealized_pnl(), Decimal::ZERO);
    }

    #[test]
    fn test_increase_weights_entry_price() {
        let mut long = Exposure::new(key(), PositionSide::Long);
        long.apply_fill(qty(dec!(1)), px(dec!(100)), false).unwrap();
        let outcome = long.apply_fill(qty(dec!(3)), px(dec!(120)), false).unwrap();

        // (1*100 + 3*120) / 4 = 115
        assert_eq!(long.entry_price(), Some(px(dec!(115))));
        assert_eq!(long.quantity(), qty(dec!(4)));
        assert_eq!(outcome.kind, FillKind::Increase);
        assert_eq!(long.fill_count(), 2);
    }

    #[test]
    fn test_reduce_long_realizes_pnl_and_keeps_entry() {
        let mut long = Exposure::new(key(), PositionSide::Long);
        long.apply_fill(qty(dec!(2)), px(dec!(100)), false).unwrap();
        let outcome = long.apply_fill(qty(dec!(0.5)), px(dec!(110)), true).unwrap();

        assert_eq!(outcome.realized_pnl, dec!(5));
        assert_eq!(long.realized_pnl(), dec!(5));
        assert_eq!(long.entry_price(), Some(px(dec!(100))));
        assert_eq!(long.quantity(), qty(dec!(1.5)));
        assert_eq!(long.state(), ExposureState::PartiallyClosing);
    }

    #[test]
    fn test_reduce_short_realizes_inverted_pnl() {
        let mut short = Exposure::new(key(), PositionSide::Short);
        short.apply_fill(qty(dec!(1)), px(dec!(100)), false).unwrap();
        let outcome = short.apply_fill(qty(dec!(1)), px(dec!(90)), true).unwrap();

        assert_eq!(outcome.realized_pnl, dec!(10));
        assert_eq!(outcome.kind, FillKind::Close);
        assert!(short.is_close());
        assert_eq!(short.state(), ExposureState::Flat);
    }

    #[test]
    fn test_over_close_leaves_exposure_unchanged() {
        let mut long = Exposure::new(key(), PositionSide::Long);
        long.apply_fill(qty(dec!(1)), px(dec!(100)), false).unwrap();

        let err = long.apply_fill(qty(dec!(1.5)), px(dec!(105)), true).unwrap_err();
        assert!(matches!(
            err,
            PositionError::OverClose { requested, available, .. }
                if requested == qty(dec!(1.5)) && available == qty(dec!(1))
        ));
        assert_eq!(long.quantity(), qty(dec!(1)));
        assert_eq!(long.realized_pnl(), Decimal::ZERO);
        assert_eq!(long.fill_count(), 1);
    }

    #[test]
    fn test_increase_past_decimal_range_leaves_exposure_unchanged() {
        let mut long = Exposure::new(key(), PositionSide::Long);
        long.apply_fill(qty(dec!(1)), px(dec!(2)), false).unwrap();

        let err = long
            .apply_fill(Quantity::new(Decimal::MAX), px(dec!(2)), false)
            .unwrap_err();
        assert!(matches!(err, PositionError::InvalidFill(CoreError::Overflow(_))));
        assert_eq!(long.quantity(), qty(dec!(1)));
        assert_eq!(long.entry_price(), Some(px(dec!(2))));
        assert_eq!(long.state(), ExposureState::PartiallyOpen);
        assert_eq!(long.fill_count(), 1);
    }

    #[test]
    fn test_entry_reweight_overflow_is_rejected() {
        let mut short = Exposure::new(key(), PositionSide::Short);
        short.apply_fill(huge(1), px(dec!(100)), false).unwrap();

        let err = short.apply_fill(qty(dec!(1)), px(dec!(1)), false).unwrap_err();
        assert!(matches!(err, PositionError::InvalidFill(CoreError::Overflow(_))));
        assert_eq!(short.quantity(), huge(1));
        assert_eq!(short.entry_price(), Some(px(dec!(100))));
    }

    #[test]
    fn test_realized_overflow_on_reduce_is_rejected() {
        let mut long = Exposure::new(key(), PositionSide::Long);
        long.apply_fill(huge(1), px(dec!(1)), false).unwrap();

        let err = long
            .apply_fill(huge(1), px(dec!(100)), true)
            .unwrap_err();
        assert!(matches!(err, PositionError::InvalidFill(CoreError::Overflow(_))));
        assert!(long.is_open());
        assert_eq!(long.realized_pnl(), Decimal::ZERO);
        assert_eq!(long.state(), ExposureState::PartiallyOpen);
    }

    #[test]
    fn test_unrealized_pnl_and_mark_idempotence() {
        let mut short = Exposure::new(key(), PositionSide::Short);
        short.apply_fill(qty(dec!(1)), px(dec!(100)), false).unwrap();

        short.set_mark_price(px(dec!(110)));
        let first = short.unrealized_pnl();
        short.set_mark_price(px(dec!(110)));
        assert_eq!(first, dec!(-10));
        assert_eq!(short.unrealized_pnl(), first);
        assert_eq!(short.notional_value(), dec!(110));
    }

    #[test]
    fn test_state_machine_cycle() {
        let mut long = Exposure::new(key(), PositionSide::Long);
        long.apply_fill(qty(dec!(1)), px(dec!(100)), false).unwrap();
        assert_eq!(long.state(), ExposureState::PartiallyOpen);
        long.apply_fill(qty(dec!(1)), px(dec!(100)), false).unwrap();
        assert_eq!(long.state(), ExposureState::Open);
        long.apply_fill(qty(dec!(0.5)), px(dec!(100)), true).unwrap();
        assert_eq!(long.state(), ExposureState::PartiallyClosing);
        long.apply_fill(qty(dec!(0.5)), px(dec!(100)), false).unwrap();
        assert_eq!(long.state(), ExposureState::Open);
        long.apply_fill(qty(dec!(2)), px(dec!(100)), true).unwrap();
        assert_eq!(long.state(), ExposureState::Flat);
    }

    #[test]
    fn test_rejects_non_positive_delta() {
        let mut long = Exposure::new(key(), PositionSide::Long);
        let err = long.apply_fill(Quantity::ZERO, px(dec!(100)), false).unwrap_err();
        assert!(matches!(err, PositionError::InvalidFill(CoreError::InvalidQuantity(_))));
    }

    #[test]
    fn test_order_fill_on_hedge_leg() {
        let mut short = Exposure::new(key(), PositionSide::Short);
        let open = Fill::new(key(), OrderAction::Sell, qty(dec!(2)), px(dec!(50))).at(1_000);
        short.apply_order_fill(&open).unwrap();
        assert_eq!(short.opened_at_ms(), Some(1_000));

        let close = Fill::new(key(), OrderAction::Buy, qty(dec!(2)), px(dec!(40))).at(2_000);
        let outcome = short.apply_order_fill(&close).unwrap();
        assert_eq!(outcome.realized_pnl, dec!(20));
        assert_eq!(short.opened_at_ms(), None);
        assert_eq!(short.last_update_ms(), 2_000);
    }

    #[test]
    fn test_reduce_only_fill_that_would_grow_is_rejected() {
        let mut long = Exposure::new(key(), PositionSide::Long);
        let fill = Fill::new(key(), OrderAction::Buy, qty(dec!(1)), px(dec!(10))).reducing();
        let err = long.apply_order_fill(&fill).unwrap_err();
        assert!(matches!(err, PositionError::ReduceMismatch { .. }));
        assert!(long.is_close());
    }

    #[test]
    fn test_one_way_nets_and_flips() {
        let mut exposure = Exposure::one_way(key());
        assert_eq!(exposure.direction(), None);

        let buy = Fill::new(key(), OrderAction::Buy, qty(dec!(1)), px(dec!(100)));
        exposure.apply_order_fill(&buy).unwrap();
        assert_eq!(exposure.direction(), Some(Direction::Long));
        assert_eq!(exposure.signed_quantity(), dec!(1));

        let sell = Fill::new(key(), OrderAction::Sell, qty(dec!(3)), px(dec!(110)));
        let outcome = exposure.apply_order_fill(&sell).unwrap();

        assert_eq!(outcome.kind, FillKind::Flip);
        assert_eq!(outcome.realized_pnl, dec!(10));
        assert_eq!(exposure.direction(), Some(Direction::Short));
        assert_eq!(exposure.quantity(), qty(dec!(2)));
        assert_eq!(exposure.entry_price(), Some(px(dec!(110))));
        assert_eq!(exposure.signed_quantity(), dec!(-2));
        assert_eq!(exposure.fill_count(), 2);
    }

    #[test]
    fn test_one_way_flip_overflow_keeps_held_direction() {
        let mut exposure = Exposure::one_way(key());
        let buy = Fill::new(key(), OrderAction::Buy, huge(1), px(dec!(1)));
        exposure.apply_order_fill(&buy).unwrap();

        let sell = Fill::new(key(), OrderAction::Sell, huge(2), px(dec!(100)));
        let err = exposure.apply_order_fill(&sell).unwrap_err();
        assert!(matches!(err, PositionError::InvalidFill(CoreError::Overflow(_))));
        assert_eq!(exposure.direction(), Some(Direction::Long));
        assert_eq!(exposure.quantity(), huge(1));
        assert_eq!(exposure.fill_count(), 1);
    }

    #[test]
    fn test_one_way_reducing_fill_cannot_flip() {
        let mut exposure = Exposure::one_way(key());
        exposure
            .apply_order_fill(&Fill::new(key(), OrderAction::Sell, qty(dec!(1)), px(dec!(100))))
            .unwrap();

        let cover = Fill::new(key(), OrderAction::Buy, qty(dec!(2)), px(dec!(90))).reducing();
        let err = exposure.apply_order_fill(&cover).unwrap_err();
        assert!(matches!(err, PositionError::OverClose { .. }));
        assert_eq!(exposure.quantity(), qty(dec!(1)));
        assert_eq!(exposure.direction(), Some(Direction::Short));
    }

    #[test]
    fn test_one_way_close_clears_direction() {
        let mut exposure = Exposure::one_way(key());
        exposure
            .apply_order_fill(&Fill::new(key(), OrderAction::Buy, qty(dec!(1)), px(dec!(100))))
            .unwrap();
        exposure
            .apply_order_fill(&Fill::new(key(), OrderAction::Sell, qty(dec!(1)), px(dec!(100))))
            .unwrap();

        assert!(exposure.is_close());
        assert_eq!(exposure.direction(), None);
    }

    #[test]
    fn test_primitive_fill_on_flat_one_way_needs_direction() {
        let mut exposure = Exposure::one_way(key());
        let err = exposure.apply_fill(qty(dec!(1)), px(dec!(1)), false).unwrap_err();
        assert!(matches!(err, PositionError::InvalidDirection(_)));
    }

    #[test]
    fn test_sync_overwrites_quantity_and_entry() {
        let mut long = Exposure::new(key(), PositionSide::Long);
        long.sync(&ExposureSync {
            quantity: qty(dec!(3)),
            entry_price: Some(px(dec!(99))),
            direction: None,
        })
        .unwrap();
        assert_eq!(long.quantity(), qty(dec!(3)));
        assert_eq!(long.entry_price(), Some(px(dec!(99))));
        assert_eq!(long.state(), ExposureState::Open);

        let err = long
            .sync(&ExposureSync {
                quantity: qty(dec!(1)),
                entry_price: None,
                direction: Some(Direction::Short),
            })
            .unwrap_err();
        assert!(matches!(err, PositionError::InvalidDirection(_)));
    }

    #[test]
    fn test_one_way_sync_requires_direction() {
        let mut exposure = Exposure::one_way(key());
        let update = ExposureSync {
            quantity: qty(dec!(1)),
            entry_price: Some(px(dec!(10))),
            direction: None,
        };
        assert!(exposure.sync(&update).is_err());

        let update = ExposureSync {
            direction: Some(Direction::Short),
            ..update
        };
        exposure.sync(&update).unwrap();
        assert_eq!(exposure.signed_quantity(), dec!(-1));
    }
}
