//! Overlap-restricted pixel comparison.

use crate::error::ComparisonError;
use crate::raster::{CHANNELS, Raster, RasterSize};
use log::{debug, info};

/// Below this fraction of differing pixels two rasters count as matched (0.1%).
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.001;

/// Largest per-channel delta still treated as equal, roughly 10% of the range.
pub const DEFAULT_CHANNEL_TOLERANCE: u8 = 25;

const DIFF_COLOR: [u8; 4] = [255, 0, 0, 255];
const SAME_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Outcome of comparing a reference raster against a candidate.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub matched: bool,
    /// `diff_pixel_count / overlap_pixel_count`, always in `[0, 1]`.
    pub diff_ratio: f64,
    pub diff_pixel_count: u64,
    pub overlap_pixel_count: u64,
    pub overlap_width: u32,
    pub overlap_height: u32,
    /// Full canvas of the reference, for diagnostics only.
    pub reference_size: RasterSize,
    /// Full canvas of the candidate, for diagnostics only.
    pub candidate_size: RasterSize,
    /// Overlap-sized map of differing pixels (red) over matching ones (black).
    pub diff_raster: Raster,
}

impl ComparisonResult {
    pub fn size_mismatch(&self) -> bool {
        self.reference_size != self.candidate_size
    }

    /// Difference expressed as a percentage, for logs and reports.
    pub fn diff_percent(&self) -> f64 {
        self.diff_ratio * 100.0
    }
}

/// Compares rasters over their top-left overlap with a per-channel tolerance.
#[derive(Debug, Clone, Copy)]
pub struct ImageComparator {
    match_threshold: f64,
    channel_tolerance: u8,
}

impl Default for ImageComparator {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            channel_tolerance: DEFAULT_CHANNEL_TOLERANCE,
        }
    }
}

impl ImageComparator {
    pub const fn new(match_threshold: f64, channel_tolerance: u8) -> Self {
        Self {
            match_threshold,
            channel_tolerance,
        }
    }

    #[must_use]
    pub const fn with_match_threshold(mut self, match_threshold: f64) -> Self {
        self.match_threshold = match_threshold;
        self
    }

    pub const fn match_threshold(&self) -> f64 {
        self.match_threshold
    }

    pub const fn channel_tolerance(&self) -> u8 {
        self.channel_tolerance
    }

    /// Compare `candidate` against `reference`.
    ///
    /// When the canvases differ in size only the top-left rectangle common to
    /// both is inspected, and the ratio is taken over that rectangle.
    ///
    /// # Errors
    ///
    /// Returns `ComparisonError::EmptyOverlap` if either raster has zero width
    /// or height.
    pub fn compare(
        &self,
        reference: &Raster,
        candidate: &Raster,
    ) -> Result<ComparisonResult, ComparisonError> {
        let reference_size = reference.size();
        let candidate_size = candidate.size();
        let overlap = reference_size.overlap(candidate_size);
        if overlap.is_empty() {
            return Err(ComparisonError::EmptyOverlap {
                reference: reference_size,
                candidate: candidate_size,
            });
        }

        debug!(
            "comparing reference {}x{} with candidate {}x{}",
            reference_size.width,
            reference_size.height,
            candidate_size.width,
            candidate_size.height
        );
        if reference_size != candidate_size {
            info!(
                "canvas sizes differ, comparing overlapping area {}x{}",
                overlap.width, overlap.height
            );
        }

        let mut diff_raster = Raster::filled(overlap.width, overlap.height, SAME_COLOR);
        let mut diff_pixel_count = 0u64;

        for y_pos in 0..overlap.height {
            let ref_row = reference.row_prefix(y_pos, overlap.width);
            let cand_row = candidate.row_prefix(y_pos, overlap.width);
            for (x_pos, (ref_px, cand_px)) in ref_row
                .chunks_exact(CHANNELS)
                .zip(cand_row.chunks_exact(CHANNELS))
                .enumerate()
            {
                if !self.pixels_match(ref_px, cand_px) {
                    diff_pixel_count += 1;
                    diff_raster.set_pixel(x_pos as u32, y_pos, DIFF_COLOR);
                }
            }
        }

        let overlap_pixel_count = overlap.area();
        let diff_ratio = diff_pixel_count as f64 / overlap_pixel_count as f64;
        let matched = diff_ratio < self.match_threshold;

        info!(
            "different pixels: {diff_pixel_count} / {overlap_pixel_count} ({:.2}%)",
            diff_ratio * 100.0
        );

        Ok(ComparisonResult {
            matched,
            diff_ratio,
            diff_pixel_count,
            overlap_pixel_count,
            overlap_width: overlap.width,
            overlap_height: overlap.height,
            reference_size,
            candidate_size,
            diff_raster,
        })
    }

    /// Two pixels match when no RGBA channel differs by more than the tolerance.
    fn pixels_match(&self, pixel_a: &[u8], pixel_b: &[u8]) -> bool {
        pixel_a
            .iter()
            .zip(pixel_b)
            .all(|(&chan_a, &chan_b)| chan_a.abs_diff(chan_b) <= self.channel_tolerance)
    }
}
