//! Run configuration for the `parity` binary.
//!
//! Values come from environment variables first; `--key=value` flags on the
//! command line override them.

use convergence::{ConvergenceOptions, InputError};
use core::time::Duration;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_STORYBOOK_URL: &str = "http://localhost:6006";
pub const DEFAULT_BLOCKS_DIR: &str = "blocks";
pub const DEFAULT_OUTPUT_DIR: &str = ".validation-screenshots";

/// Project file consulted for the Figma file id when none is configured.
pub const FIGMA_URLS_FILE: &str = "config/figma/figma-urls.json";

pub const USAGE: &str = "usage: parity --component=<id> (--node-id=<figma node> [--file-id=<figma file>] | --reference=<png>) \
[--variant=<story>] [--threshold=<ratio>] [--max-iterations=<n>] [--settle-ms=<ms>] [--timeout-secs=<s>]";

/// Where the reference design comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceSource {
    /// A node rendered by the Figma images API.
    Figma { file_id: String, node_id: String },
    /// A PNG already on disk.
    File(PathBuf),
}

/// Everything one `parity` invocation needs.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub component: String,
    pub reference: ReferenceSource,
    pub figma_token: Option<String>,
    pub storybook_url: Url,
    pub blocks_dir: PathBuf,
    pub output_dir: PathBuf,
    pub chrome_bin: Option<PathBuf>,
    /// Deadline for the whole run; none means wait indefinitely.
    pub timeout: Option<Duration>,
    pub options: ConvergenceOptions,
}

#[derive(Deserialize)]
struct FigmaUrls {
    #[serde(rename = "fileId")]
    file_id: Option<String>,
}

impl RunConfig {
    /// Load from the process environment and command line.
    ///
    /// Reads the following environment variables:
    /// - `FIGMA_PERSONAL_ACCESS_TOKEN` or `FIGMA_ACCESS_TOKEN`: Figma API token
    /// - `FIGMA_FILE_ID`: Figma file holding the design nodes
    /// - `PARITY_STORYBOOK_URL`: Storybook root (default: `http://localhost:6006`)
    /// - `PARITY_BLOCKS_DIR`: directory of component folders (default: `blocks`)
    /// - `PARITY_OUTPUT_DIR`: screenshots and reports (default: `.validation-screenshots`)
    /// - `PARITY_TIMEOUT_SECS`: deadline for the whole run
    /// - `CHROME_BIN`: Chrome executable; auto-detected when unset
    /// - the `PARITY_*` run options read by [`ConvergenceOptions::from_env`]
    ///
    /// # Errors
    ///
    /// Returns an `InputError` for unknown flags, unparseable values or a
    /// missing component or design.
    pub fn from_env() -> Result<Self, InputError> {
        Self::from_sources(env::args().skip(1), |name| env::var(name).ok())
    }

    /// Build from explicit arguments (without the program name) and an
    /// environment lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_sources<I, F>(args: I, lookup: F) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|val| !val.trim().is_empty());

        let mut options = ConvergenceOptions::from_lookup(&lookup)?;
        let mut component = None;
        let mut node_id = None;
        let mut file_id = var("FIGMA_FILE_ID");
        let mut reference_file = None;
        let mut storybook =
            var("PARITY_STORYBOOK_URL").unwrap_or_else(|| DEFAULT_STORYBOOK_URL.to_owned());
        let mut blocks_dir =
            var("PARITY_BLOCKS_DIR").unwrap_or_else(|| DEFAULT_BLOCKS_DIR.to_owned());
        let mut output_dir =
            var("PARITY_OUTPUT_DIR").unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_owned());
        let mut timeout_secs = var("PARITY_TIMEOUT_SECS");

        for arg in args {
            let Some((name, value)) = arg.strip_prefix("--").and_then(|flag| flag.split_once('='))
            else {
                return Err(InputError::UnknownOption(arg));
            };
            let value = value.trim().to_owned();
            match name {
                "component" | "block" => component = Some(value),
                "node-id" => node_id = Some(value),
                "file-id" => file_id = Some(value),
                "reference" => reference_file = Some(value),
                "storybook-url" => storybook = value,
                "blocks-dir" => blocks_dir = value,
                "output-dir" => output_dir = value,
                "timeout-secs" => timeout_secs = Some(value),
                _ => {
                    if !options.set(name, &value)? {
                        return Err(InputError::UnknownOption(arg));
                    }
                }
            }
        }

        let component = component
            .filter(|id| !id.is_empty())
            .ok_or_else(|| InputError::MissingOption("component".to_owned()))?;

        let reference = match (reference_file, node_id) {
            (Some(path), _) => ReferenceSource::File(PathBuf::from(path)),
            (None, Some(node_id)) => {
                let file_id = file_id
                    .or_else(|| file_id_from_project(Path::new(FIGMA_URLS_FILE)))
                    .ok_or_else(|| InputError::MissingOption("file-id".to_owned()))?;
                ReferenceSource::Figma { file_id, node_id }
            }
            (None, None) => return Err(InputError::MissingOption("node-id".to_owned())),
        };

        let storybook_url = Url::parse(&storybook).map_err(|_| InputError::InvalidOption {
            name: "storybook-url".to_owned(),
            value: storybook.clone(),
        })?;

        let timeout = timeout_secs
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| InputError::InvalidOption {
                        name: "timeout-secs".to_owned(),
                        value: raw,
                    })
            })
            .transpose()?;

        Ok(Self {
            component,
            reference,
            figma_token: var("FIGMA_PERSONAL_ACCESS_TOKEN").or_else(|| var("FIGMA_ACCESS_TOKEN")),
            storybook_url,
            blocks_dir: PathBuf::from(blocks_dir),
            output_dir: PathBuf::from(output_dir),
            chrome_bin: var("CHROME_BIN").map(PathBuf::from),
            timeout,
            options,
        })
    }

    /// The identifier handed to the reference provider.
    pub fn design_id(&self) -> String {
        match &self.reference {
            ReferenceSource::Figma { node_id, .. } => node_id.clone(),
            ReferenceSource::File(path) => path.display().to_string(),
        }
    }
}

/// Read `fileId` from the project's Figma URL map, if there is one.
fn file_id_from_project(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    serde_json::from_str::<FigmaUrls>(&text)
        .ok()?
        .file_id
        .filter(|id| !id.trim().is_empty())
}
