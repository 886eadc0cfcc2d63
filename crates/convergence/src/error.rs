//! Error taxonomy for a convergence run.

use crate::ports::{ProviderError, RenderError};
use core::fmt::{self, Display, Formatter};
use raster_diff::ComparisonError;
use serde::Serialize;
use std::error::Error;
use style_patch::PatchError;

/// Invalid identifiers or options; rejected before any I/O happens.
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    InvalidComponentId(String),
    EmptyDesignId,
    ThresholdOutOfRange(f64),
    ZeroIterationCap,
    EmptyVariant,
    /// A flag or environment value that could not be understood.
    InvalidOption { name: String, value: String },
    UnknownOption(String),
    MissingOption(String),
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidComponentId(raw) => write!(
                f,
                "invalid component id `{raw}`: expected a CSS class name"
            ),
            Self::EmptyDesignId => f.write_str("design id must not be empty"),
            Self::ThresholdOutOfRange(value) => {
                write!(f, "match threshold {value} is outside (0, 1]")
            }
            Self::ZeroIterationCap => f.write_str("iteration cap must be at least 1"),
            Self::EmptyVariant => f.write_str("variant must not be empty"),
            Self::InvalidOption { name, value } => {
                write!(f, "invalid value `{value}` for option `{name}`")
            }
            Self::UnknownOption(raw) => write!(f, "unknown option `{raw}`"),
            Self::MissingOption(name) => write!(f, "missing required option `--{name}`"),
        }
    }
}

impl Error for InputError {}

/// Reference or candidate could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    Reference(ProviderError),
    Candidate(RenderError),
}

impl Display for AcquisitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(err) => write!(f, "reference acquisition failed: {err}"),
            Self::Candidate(err) => write!(f, "candidate acquisition failed: {err}"),
        }
    }
}

impl Error for AcquisitionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Reference(err) => Some(err),
            Self::Candidate(err) => Some(err),
        }
    }
}

/// Anything that ends a run in the `Aborted` state.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvergenceError {
    Input(InputError),
    Acquisition(AcquisitionError),
    Comparison(ComparisonError),
    Patch(PatchError),
    /// The caller's cancellation or deadline fired.
    Cancelled(String),
}

impl ConvergenceError {
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Input(_) => FailureKind::Input,
            Self::Acquisition(_) => FailureKind::Acquisition,
            Self::Comparison(_) => FailureKind::Comparison,
            Self::Patch(_) => FailureKind::Patch,
            Self::Cancelled(_) => FailureKind::Cancelled,
        }
    }
}

impl Display for ConvergenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(err) => write!(f, "{err}"),
            Self::Acquisition(err) => write!(f, "{err}"),
            Self::Comparison(err) => write!(f, "comparison failed: {err}"),
            Self::Patch(err) => write!(f, "{err}"),
            Self::Cancelled(reason) => write!(f, "run cancelled: {reason}"),
        }
    }
}

impl Error for ConvergenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Input(err) => Some(err),
            Self::Acquisition(err) => Some(err),
            Self::Comparison(err) => Some(err),
            Self::Patch(err) => Some(err),
            Self::Cancelled(_) => None,
        }
    }
}

impl From<InputError> for ConvergenceError {
    fn from(err: InputError) -> Self {
        Self::Input(err)
    }
}

impl From<AcquisitionError> for ConvergenceError {
    fn from(err: AcquisitionError) -> Self {
        Self::Acquisition(err)
    }
}

impl From<ComparisonError> for ConvergenceError {
    fn from(err: ComparisonError) -> Self {
        Self::Comparison(err)
    }
}

impl From<PatchError> for ConvergenceError {
    fn from(err: PatchError) -> Self {
        Self::Patch(err)
    }
}

/// Serializable class of a failure, for reports and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    Input,
    Acquisition,
    Comparison,
    Patch,
    Cancelled,
    /// The iteration cap was reached without a match.
    Exhausted,
}
