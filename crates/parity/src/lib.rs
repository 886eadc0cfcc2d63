//! Adapters and plumbing for the `parity` command: Figma and file references,
//! Storybook rendering through headless Chrome, on-disk component styles and
//! run reports.

pub mod config;
pub mod figma;
pub mod reference;
pub mod report;
pub mod storybook;
pub mod style_files;
