//! Capabilities the controller consumes but does not implement.
//!
//! Fetching the design, rendering the component and persisting styles are
//! all I/O owned by adapters; the controller only sequences them.

use crate::ids::{ComponentId, DesignId, IntrinsicSize, Viewport};
use core::fmt::{self, Display, Formatter};
use core::time::Duration;
use raster_diff::Raster;
use std::error::Error;

/// A reference raster and, when known, the design frame's own size.
#[derive(Clone, Debug)]
pub struct ReferenceImage {
    pub raster: Raster,
    pub intrinsic_size: Option<IntrinsicSize>,
}

/// Failures fetching the reference design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The design service could not be reached or answered with an error.
    RemoteUnavailable(String),
    /// The design id does not resolve to an image.
    NotFound(String),
    /// Credentials are missing or were rejected.
    AuthRequired(String),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteUnavailable(msg) => write!(f, "design service unavailable: {msg}"),
            Self::NotFound(msg) => write!(f, "design not found: {msg}"),
            Self::AuthRequired(msg) => write!(f, "design service requires authentication: {msg}"),
        }
    }
}

impl Error for ProviderError {}

/// Failures rendering the candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The renderer process or page host could not be reached.
    RendererUnreachable(String),
    /// The component's element is not on the rendered page.
    ElementNotFound(String),
    /// Rendering did not complete in time.
    Timeout(Duration),
    /// The renderer returned bytes that are not a raster.
    MalformedRaster(String),
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::RendererUnreachable(msg) => write!(f, "renderer unreachable: {msg}"),
            Self::ElementNotFound(msg) => write!(f, "element not found: {msg}"),
            Self::Timeout(after) => write!(f, "render timed out after {after:?}"),
            Self::MalformedRaster(msg) => write!(f, "renderer returned a malformed raster: {msg}"),
        }
    }
}

impl Error for RenderError {}

/// Failure reading or writing a style source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSourceError(pub String);

impl Display for StyleSourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for StyleSourceError {}

/// Produces the design-of-record raster for a design id.
#[allow(async_fn_in_trait, reason = "adapters are driven from a single task")]
pub trait ReferenceImageProvider {
    /// # Errors
    ///
    /// See [`ProviderError`].
    async fn fetch(&mut self, design: &DesignId) -> Result<ReferenceImage, ProviderError>;
}

/// Produces a screenshot of the live component.
#[allow(async_fn_in_trait, reason = "adapters are driven from a single task")]
pub trait CandidateRenderer {
    /// # Errors
    ///
    /// See [`RenderError`].
    async fn render(
        &mut self,
        component: &ComponentId,
        variant: &str,
        viewport: Viewport,
    ) -> Result<Raster, RenderError>;
}

/// The stylesheet text a component is styled by.
///
/// Writes happen in place; two runs against the same source must be
/// serialized by the caller.
pub trait StyleSource {
    /// # Errors
    ///
    /// Returns `StyleSourceError` if the text cannot be loaded.
    fn read(&mut self, component: &ComponentId) -> Result<String, StyleSourceError>;

    /// # Errors
    ///
    /// Returns `StyleSourceError` if the text cannot be stored.
    fn write(&mut self, component: &ComponentId, text: &str) -> Result<(), StyleSourceError>;
}
