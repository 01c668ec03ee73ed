//! Core data types, slot geometry, and unit conversion for solar power logging
//!
//! This crate holds everything the aggregation engine needs that does not
//! touch a database: the record model, the four summary resolutions, the
//! per-slot accumulator, deadline bookkeeping and the row store seam.

pub mod deadline;
pub mod rollups;
pub mod slots;
pub mod store;
pub mod types;
pub mod units;

pub use deadline::*;
pub use rollups::*;
pub use slots::*;
pub use store::*;
pub use types::*;
pub use units::*;
