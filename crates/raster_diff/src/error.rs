use crate::raster::RasterSize;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Failures raised while building or comparing rasters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonError {
    /// One of the rasters has zero width or height, so there is nothing to compare.
    EmptyOverlap {
        reference: RasterSize,
        candidate: RasterSize,
    },
    /// Pixel buffer length disagrees with the declared dimensions.
    MalformedRaster { expected: usize, actual: usize },
    /// Image bytes could not be decoded.
    Decode(String),
    /// Raster could not be encoded.
    Encode(String),
}

impl Display for ComparisonError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyOverlap {
                reference,
                candidate,
            } => write!(
                f,
                "zero-area overlap: reference {}x{}, candidate {}x{}",
                reference.width, reference.height, candidate.width, candidate.height
            ),
            Self::MalformedRaster { expected, actual } => write!(
                f,
                "malformed raster: expected {expected} bytes of RGBA data, got {actual}"
            ),
            Self::Decode(msg) => write!(f, "failed to decode image: {msg}"),
            Self::Encode(msg) => write!(f, "failed to encode image: {msg}"),
        }
    }
}

impl Error for ComparisonError {}
