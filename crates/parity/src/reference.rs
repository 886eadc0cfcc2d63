//! Reference providers selectable from the command line.

use crate::config::{ReferenceSource, RunConfig};
use crate::figma::FigmaProvider;
use crate::report::{reference_file_name, save_snapshot};
use convergence::{DesignId, ProviderError, ReferenceImage, ReferenceImageProvider};
use log::info;
use raster_diff::Raster;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Loads a PNG from disk; the design id is its path.
#[derive(Debug, Default)]
pub struct FileReferenceProvider {
    snapshot_path: Option<PathBuf>,
}

impl FileReferenceProvider {
    pub const fn new() -> Self {
        Self {
            snapshot_path: None,
        }
    }

    /// Also copy the reference to `path`.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }
}

impl ReferenceImageProvider for FileReferenceProvider {
    async fn fetch(&mut self, design: &DesignId) -> Result<ReferenceImage, ProviderError> {
        let path = PathBuf::from(design.as_str());
        let bytes = fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ProviderError::NotFound(path.display().to_string()),
            ErrorKind::PermissionDenied => {
                ProviderError::AuthRequired(format!("{}: {err}", path.display()))
            }
            _ => ProviderError::RemoteUnavailable(format!("{}: {err}", path.display())),
        })?;
        if let Some(snapshot) = self.snapshot_path.as_ref().filter(|snapshot| **snapshot != path) {
            save_snapshot(snapshot, &bytes);
        }
        let raster = Raster::decode_png(&bytes).map_err(|err| {
            ProviderError::RemoteUnavailable(format!("{} is not an image: {err}", path.display()))
        })?;
        info!(
            "loaded reference {} ({}x{})",
            path.display(),
            raster.width(),
            raster.height()
        );
        Ok(ReferenceImage {
            raster,
            intrinsic_size: None,
        })
    }
}

/// The provider a [`RunConfig`] asks for.
pub enum ReferenceProvider {
    Figma(FigmaProvider),
    File(FileReferenceProvider),
}

impl ReferenceProvider {
    /// Build the provider for `config`, saving the reference next to the
    /// other run artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &RunConfig) -> anyhow::Result<Self> {
        let snapshot = config
            .output_dir
            .join(reference_file_name(&config.component));
        Ok(match &config.reference {
            ReferenceSource::Figma { file_id, .. } => Self::Figma(
                FigmaProvider::new(file_id.clone(), config.figma_token.clone())?
                    .with_snapshot_path(snapshot),
            ),
            ReferenceSource::File(_) => {
                Self::File(FileReferenceProvider::new().with_snapshot_path(snapshot))
            }
        })
    }
}

impl ReferenceImageProvider for ReferenceProvider {
    async fn fetch(&mut self, design: &DesignId) -> Result<ReferenceImage, ProviderError> {
        match self {
            Self::Figma(provider) => provider.fetch(design).await,
            Self::File(provider) => provider.fetch(design).await,
        }
    }
}
