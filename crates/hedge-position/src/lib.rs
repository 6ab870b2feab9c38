//! Hedge-mode position accounting.
//!
//! - [`Exposure`]: one directional position record
//! - [`ExposurePair`]: long and short exposures of one instrument, plus
//!   routing of fills between them
//! - [`PositionRegistry`]: every configured instrument, one-way or hedge
//! - [`PositionView`]: read-only facade shared by all three

pub mod error;
pub mod exposure;
pub mod pair;
pub mod registry;
pub mod snapshot;
pub mod view;

pub use error::{PositionError, PositionResult};
pub use exposure::{Exposure, ExposureState, ExposureSync, FillKind, FillOutcome};
pub use pair::{ExposurePair, NetDirection, PairSync, Route, RoutingPolicy};
pub use registry::{EntrySync, PositionRegistry, RegistryEntry};
pub use snapshot::{EntrySnapshot, ExposureSnapshot, PairSnapshot, RegistrySnapshot};
pub use view::PositionView;
