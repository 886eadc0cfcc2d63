//! Raster comparison for visual parity checks.
//!
//! Rasters are compared over the top-left rectangle they have in common, so a
//! candidate captured at a slightly different canvas size still yields a
//! well-defined difference ratio instead of failing outright.

mod compare;
mod error;
mod raster;

pub use compare::{
    ComparisonResult, DEFAULT_CHANNEL_TOLERANCE, DEFAULT_MATCH_THRESHOLD, ImageComparator,
};
pub use error::ComparisonError;
pub use raster::{CHANNELS, Raster, RasterSize};
