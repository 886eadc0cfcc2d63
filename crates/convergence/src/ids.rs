//! Validated identifiers and sizes passed across the controller boundary.

use crate::error::InputError;
use core::fmt::{self, Display, Formatter};
use serde::Serialize;

/// Names a component; doubles as the class of its root rule block.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Validate a component identifier.
    ///
    /// It must be usable as a CSS class name: ASCII letters, digits, `-` and
    /// `_`, not starting with a digit.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidComponentId` otherwise.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        let valid_start = trimmed
            .chars()
            .next()
            .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_' || ch == '-');
        let valid_rest = trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid_start || !valid_rest {
            return Err(InputError::InvalidComponentId(raw.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names a reference design (a Figma node id, a file path, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DesignId(String);

impl DesignId {
    /// # Errors
    ///
    /// Returns `InputError::EmptyDesignId` for blank input.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyDesignId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DesignId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Target viewport for rendering, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Extra height given to the candidate viewport so overflow is captured.
pub const VIEWPORT_OVERFLOW_PADDING: u32 = 100;

/// Viewport used when the reference provider reports no size.
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1160,
    height: 1200,
};

/// Size of the design frame as reported by the design tool.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IntrinsicSize {
    pub width: f64,
    pub height: f64,
}

impl IntrinsicSize {
    /// Smallest integral viewport containing this size plus overflow padding.
    pub fn to_viewport(self) -> Viewport {
        Viewport {
            width: self.width.max(1.0).ceil() as u32,
            height: (self.height.max(1.0) + f64::from(VIEWPORT_OVERFLOW_PADDING)).ceil() as u32,
        }
    }
}
