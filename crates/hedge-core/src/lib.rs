//! Core domain types for hedge-mode position accounting.
//!
//! This crate provides the primitives shared by every other crate:
//! - `Price`, `Quantity`: Precision-safe numeric types
//! - `VenueId`, `InstrumentId`, `InstrumentKey`: Where an exposure lives
//! - `PositionMode`: One-way vs hedge, resolved per venue
//! - `OrderAction`, `Direction`, `PositionSide`: The direction vocabulary
//! - `Fill`, `MarkPriceUpdate`: Events delivered by the execution engine

pub mod decimal;
pub mod error;
pub mod event;
pub mod instrument;
pub mod side;

pub use decimal::{Price, Quantity};
pub use error::{CoreError, Result};
pub use event::{Fill, MarkPriceUpdate};
pub use instrument::{InstrumentId, InstrumentKey, PositionMode, VenueId};
pub use side::{Direction, OrderAction, PositionSide};
