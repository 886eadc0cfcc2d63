use core::fmt::{self, Display, Formatter};
use std::error::Error;

/// Why a corrective patch could not be produced or persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchError {
    /// The ratio is in the manual review band; there is nothing to apply.
    NoCorrections { diff_ratio: f64 },
    /// The component's root rule block does not exist.
    RootBlockMissing { selector: String },
    /// The style source could not be read or written.
    StyleSource(String),
}

impl Display for PatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCorrections { diff_ratio } => write!(
                f,
                "unable to patch: no automatic corrections for {:.2}% difference, manual review required",
                diff_ratio * 100.0
            ),
            Self::RootBlockMissing { selector } => {
                write!(f, "unable to patch: no `{selector}` rule block in the style source")
            }
            Self::StyleSource(msg) => write!(f, "unable to patch: style source error: {msg}"),
        }
    }
}

impl Error for PatchError {}
