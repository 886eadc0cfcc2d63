//! Reference designs rendered by the Figma REST API.

use crate::report::save_snapshot;
use convergence::{DesignId, IntrinsicSize, ProviderError, ReferenceImage, ReferenceImageProvider};
use core::time::Duration;
use log::{debug, info, warn};
use raster_diff::Raster;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

pub const FIGMA_API_BASE: &str = "https://api.figma.com/v1/";

/// Images are requested at twice their design size, matching the renderer's
/// device scale factor.
pub const EXPORT_SCALE: u32 = 2;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct ImagesResponse {
    err: Option<String>,
    #[serde(default)]
    images: HashMap<String, Option<String>>,
}

#[derive(Deserialize)]
struct NodesResponse {
    #[serde(default)]
    nodes: HashMap<String, Option<NodeEntry>>,
}

#[derive(Deserialize)]
struct NodeEntry {
    document: NodeDocument,
}

#[derive(Deserialize)]
struct NodeDocument {
    #[serde(rename = "absoluteBoundingBox")]
    absolute_bounding_box: Option<BoundingBox>,
}

#[derive(Deserialize)]
struct BoundingBox {
    width: f64,
    height: f64,
}

/// Fetches a node of one Figma file as a PNG.
pub struct FigmaProvider {
    client: Client,
    api_base: Url,
    file_id: String,
    token: Option<String>,
    snapshot_path: Option<PathBuf>,
}

impl FigmaProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(file_id: String, token: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: Url::parse(FIGMA_API_BASE)?,
            file_id,
            token,
            snapshot_path: None,
        })
    }

    /// Point at another API root. It must end with `/`.
    #[must_use]
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    /// Also save the downloaded PNG to `path`.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }

    fn endpoint(&self, path_and_query: &str) -> Result<Url, ProviderError> {
        self.api_base
            .join(path_and_query)
            .map_err(|err| ProviderError::RemoteUnavailable(format!("bad API url: {err}")))
    }

    /// Figma API url rendering `node` as PNG.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::RemoteUnavailable` if the url cannot be built.
    pub fn images_url(&self, node: &str) -> Result<Url, ProviderError> {
        self.endpoint(&format!(
            "images/{}?ids={}&format=png&scale={EXPORT_SCALE}",
            urlencoding::encode(&self.file_id),
            urlencoding::encode(node)
        ))
    }

    /// Figma API url describing `node`, including its bounding box.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::RemoteUnavailable` if the url cannot be built.
    pub fn nodes_url(&self, node: &str) -> Result<Url, ProviderError> {
        self.endpoint(&format!(
            "files/{}/nodes?ids={}",
            urlencoding::encode(&self.file_id),
            urlencoding::encode(node)
        ))
    }

    async fn get(&self, url: Url, token: Option<&str>) -> Result<Vec<u8>, ProviderError> {
        debug!("GET {url}");
        let mut request = self.client.get(url.clone());
        if let Some(token) = token {
            request = request.header("X-Figma-Token", token);
        }
        let response = request
            .send()
            .await
            .map_err(|err| ProviderError::RemoteUnavailable(format!("{url}: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, url.as_str()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| ProviderError::RemoteUnavailable(format!("{url}: {err}")))?;
        Ok(body.to_vec())
    }

    /// Size of the node's frame. Any failure only costs the hint.
    async fn intrinsic_size(&self, node: &str, token: &str) -> Option<IntrinsicSize> {
        let body = match self.nodes_url(node) {
            Ok(url) => self.get(url, Some(token)).await,
            Err(err) => Err(err),
        };
        match body {
            Ok(body) => {
                let size = parse_intrinsic_size(&body, node);
                if size.is_none() {
                    info!("no bounding box for node {node}, using the default viewport");
                }
                size
            }
            Err(err) => {
                warn!("could not read the size of node {node}: {err}");
                None
            }
        }
    }
}

impl ReferenceImageProvider for FigmaProvider {
    async fn fetch(&mut self, design: &DesignId) -> Result<ReferenceImage, ProviderError> {
        let Some(token) = self.token.clone() else {
            return Err(ProviderError::AuthRequired(
                "set FIGMA_PERSONAL_ACCESS_TOKEN or FIGMA_ACCESS_TOKEN".to_owned(),
            ));
        };
        let node = design.as_str();
        info!("fetching Figma node {node} from file {}", self.file_id);

        let intrinsic_size = self.intrinsic_size(node, &token).await;

        let body = self.get(self.images_url(node)?, Some(&token)).await?;
        let image_url = parse_image_url(&body, node)?;
        let download = Url::parse(&image_url)
            .map_err(|err| ProviderError::RemoteUnavailable(format!("bad image url: {err}")))?;
        let png = self.get(download, None).await?;

        if let Some(path) = &self.snapshot_path {
            save_snapshot(path, &png);
        }

        let raster = Raster::decode_png(&png).map_err(|err| {
            ProviderError::RemoteUnavailable(format!("reference for node {node} is not an image: {err}"))
        })?;
        Ok(ReferenceImage {
            raster,
            intrinsic_size,
        })
    }
}

/// Map a failed HTTP status to the provider taxonomy.
pub fn classify_status(status: StatusCode, context: &str) -> ProviderError {
    let message = format!("{context} answered {status}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthRequired(message),
        StatusCode::NOT_FOUND => ProviderError::NotFound(message),
        _ => ProviderError::RemoteUnavailable(message),
    }
}

/// Pick the rendered image url for `node` out of an images API body.
///
/// # Errors
///
/// `NotFound` when the node has no image, `RemoteUnavailable` when the body
/// is not an images response or reports an error.
pub fn parse_image_url(body: &[u8], node: &str) -> Result<String, ProviderError> {
    let response: ImagesResponse = serde_json::from_slice(body).map_err(|err| {
        ProviderError::RemoteUnavailable(format!("unexpected images response: {err}"))
    })?;
    if let Some(err) = response.err {
        return Err(ProviderError::RemoteUnavailable(format!("Figma API error: {err}")));
    }
    response
        .images
        .get(node)
        .cloned()
        .flatten()
        .ok_or_else(|| ProviderError::NotFound(format!("no image url for node {node}")))
}

/// Read the bounding box of `node` out of a nodes API body.
pub fn parse_intrinsic_size(body: &[u8], node: &str) -> Option<IntrinsicSize> {
    let response: NodesResponse = serde_json::from_slice(body).ok()?;
    let bounds = response
        .nodes
        .get(node)?
        .as_ref()?
        .document
        .absolute_bounding_box
        .as_ref()?;
    Some(IntrinsicSize {
        width: bounds.width,
        height: bounds.height,
    })
}
