//! Bounded render / compare / patch convergence for UI components.
//!
//! [`ConvergenceController`] sequences three capabilities supplied by the
//! caller: a [`ReferenceImageProvider`] for the design, a
//! [`CandidateRenderer`] for the live component and a [`StyleSource`] holding
//! its stylesheet. Every run ends with a [`FinalReport`].

mod controller;
mod error;
mod ids;
mod options;
mod ports;
mod report;
mod state;

pub use controller::{ConvergenceController, viewport_for};
pub use error::{AcquisitionError, ConvergenceError, FailureKind, InputError};
pub use ids::{
    ComponentId, DEFAULT_VIEWPORT, DesignId, IntrinsicSize, VIEWPORT_OVERFLOW_PADDING, Viewport,
};
pub use options::{
    ConvergenceOptions, DEFAULT_ITERATION_CAP, DEFAULT_SETTLE_DURATION, DEFAULT_VARIANT,
};
pub use ports::{
    CandidateRenderer, ProviderError, ReferenceImage, ReferenceImageProvider, RenderError,
    StyleSource, StyleSourceError,
};
pub use report::{FinalReport, IterationSummary};
pub use state::{ConvergenceState, IterationRecord, RunStatus};
