//! Run options for the convergence controller.
//!
//! Options can be loaded from environment variables or constructed
//! programmatically; either way they are validated before a run starts.

use crate::error::InputError;
use core::time::Duration;
use raster_diff::{DEFAULT_CHANNEL_TOLERANCE, DEFAULT_MATCH_THRESHOLD};
use std::env;

/// Default number of render/compare iterations per run.
pub const DEFAULT_ITERATION_CAP: u32 = 5;

/// Default wait for a live-reload environment to pick up a style write.
pub const DEFAULT_SETTLE_DURATION: Duration = Duration::from_millis(3000);

/// Story variant rendered when none is given.
pub const DEFAULT_VARIANT: &str = "default";

/// Environment variables and the option each one sets.
const ENV_OPTIONS: &[(&str, &str)] = &[
    ("PARITY_MATCH_THRESHOLD", "threshold"),
    ("PARITY_MAX_ITERATIONS", "max-iterations"),
    ("PARITY_SETTLE_MS", "settle-ms"),
    ("PARITY_CHANNEL_TOLERANCE", "channel-tolerance"),
    ("PARITY_VARIANT", "variant"),
];

/// Tunables for a single `invoke()`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvergenceOptions {
    /// A comparison matches when its diff ratio is strictly below this.
    pub match_threshold: f64,
    /// Hard ceiling on render/compare iterations.
    pub iteration_cap: u32,
    /// Fixed wait after each style write.
    pub settle_duration: Duration,
    /// Per-channel tolerance handed to the comparator.
    pub channel_tolerance: u8,
    /// Which rendering of the component to capture.
    pub variant: String,
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            iteration_cap: DEFAULT_ITERATION_CAP,
            settle_duration: DEFAULT_SETTLE_DURATION,
            channel_tolerance: DEFAULT_CHANNEL_TOLERANCE,
            variant: DEFAULT_VARIANT.to_owned(),
        }
    }
}

impl ConvergenceOptions {
    /// Load options from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `PARITY_MATCH_THRESHOLD`: match ratio threshold (default: 0.001)
    /// - `PARITY_MAX_ITERATIONS`: iteration cap (default: 5)
    /// - `PARITY_SETTLE_MS`: settle wait in milliseconds (default: 3000)
    /// - `PARITY_CHANNEL_TOLERANCE`: per-channel tolerance 0-255 (default: 25)
    /// - `PARITY_VARIANT`: story variant (default: `default`)
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` for a variable that is set but unparseable.
    pub fn from_env() -> Result<Self, InputError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` for a variable that is set but unparseable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InputError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        for &(var, option) in ENV_OPTIONS {
            if let Some(raw) = lookup(var).filter(|val| !val.trim().is_empty()) {
                options.set(option, &raw)?;
            }
        }
        Ok(options)
    }

    /// Set one option by its command-line name. Returns `Ok(false)` for names
    /// that are not convergence options.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidOption` if `value` does not parse.
    pub fn set(&mut self, name: &str, value: &str) -> Result<bool, InputError> {
        let invalid = || InputError::InvalidOption {
            name: name.to_owned(),
            value: value.to_owned(),
        };
        match name {
            "threshold" => self.match_threshold = value.trim().parse().map_err(|_| invalid())?,
            "max-iterations" => self.iteration_cap = value.trim().parse().map_err(|_| invalid())?,
            "settle-ms" => {
                let millis: u64 = value.trim().parse().map_err(|_| invalid())?;
                self.settle_duration = Duration::from_millis(millis);
            }
            "channel-tolerance" => {
                self.channel_tolerance = value.trim().parse().map_err(|_| invalid())?;
            }
            "variant" => value.trim().clone_into(&mut self.variant),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns the first constraint violated.
    pub fn validate(&self) -> Result<(), InputError> {
        if !(self.match_threshold > 0.0 && self.match_threshold <= 1.0) {
            return Err(InputError::ThresholdOutOfRange(self.match_threshold));
        }
        if self.iteration_cap == 0 {
            return Err(InputError::ZeroIterationCap);
        }
        if self.variant.is_empty() {
            return Err(InputError::EmptyVariant);
        }
        Ok(())
    }
}
