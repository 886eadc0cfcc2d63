//! Corrective style patches for visual parity runs.
//!
//! [`PatchAdvisor`] turns a difference ratio into a fixed tier of
//! [`Correction`]s and merges them into the component's root rule of a
//! [`Stylesheet`].

mod advisor;
mod error;
mod stylesheet;

pub use advisor::{AppliedPatch, Correction, PatchAdvisor, PatchTier, root_selector};
pub use error::PatchError;
pub use stylesheet::{Declaration, PropertyChange, StyleRule, Stylesheet};
