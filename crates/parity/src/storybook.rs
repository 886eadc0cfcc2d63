//! Candidate screenshots of Storybook stories taken with headless Chrome.

use crate::report::{candidate_file_name, save_snapshot};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page;
use convergence::{CandidateRenderer, ComponentId, DEFAULT_VIEWPORT, RenderError, Viewport};
use core::time::Duration;
use futures::StreamExt as _;
use log::{debug, info, warn};
use raster_diff::Raster;
use std::path::{Path, PathBuf};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use url::Url;

/// Upper bound on loading a story.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed wait after load for fonts, images and story effects.
pub const POST_LOAD_WAIT: Duration = Duration::from_secs(2);

/// Upper bound on the reachability check before a run.
pub const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Matches the scale reference designs are exported at.
pub const DEVICE_SCALE_FACTOR: f64 = 2.0;

/// Browser with its background event handler.
struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Renders `{storybook}/iframe.html?id=blocks-{component}--{variant}`.
///
/// Chrome is launched on the first render and reused until [`Self::shutdown`].
pub struct ChromeRenderer {
    storybook_url: Url,
    chrome_bin: Option<PathBuf>,
    snapshot_dir: Option<PathBuf>,
    session: Option<ChromeSession>,
    renders: u32,
}

impl ChromeRenderer {
    pub const fn new(storybook_url: Url, chrome_bin: Option<PathBuf>) -> Self {
        Self {
            storybook_url,
            chrome_bin,
            snapshot_dir: None,
            session: None,
            renders: 0,
        }
    }

    /// Save every captured PNG into `dir`, numbered by render.
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: PathBuf) -> Self {
        self.snapshot_dir = Some(dir);
        self
    }

    /// Close the browser if one was launched.
    pub async fn shutdown(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Err(err) = session.browser.close().await {
            warn!("failed to close Chrome: {err}");
        }
        if let Err(err) = session.browser.wait().await {
            debug!("waiting for Chrome to exit: {err}");
        }
        session.handler.abort();
    }

    async fn session(&mut self) -> Result<&ChromeSession, RenderError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => launch(self.chrome_bin.as_deref()).await?,
        };
        Ok(self.session.insert(session))
    }
}

impl CandidateRenderer for ChromeRenderer {
    async fn render(
        &mut self,
        component: &ComponentId,
        variant: &str,
        viewport: Viewport,
    ) -> Result<Raster, RenderError> {
        let url = story_url(&self.storybook_url, component.as_str(), variant)?;
        let session = self.session().await?;
        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|err| RenderError::RendererUnreachable(format!("cannot open a tab: {err}")))?;

        let captured = capture(&page, &url, component, viewport).await;
        if let Err(err) = page.close().await {
            debug!("closing tab: {err}");
        }
        let png = captured?;

        self.renders += 1;
        if let Some(dir) = &self.snapshot_dir {
            save_snapshot(
                &dir.join(candidate_file_name(component.as_str(), self.renders)),
                &png,
            );
        }
        Raster::decode_png(&png).map_err(|err| RenderError::MalformedRaster(err.to_string()))
    }
}

/// Checks that Storybook answers at `storybook_url` with a success status.
///
/// # Errors
///
/// Returns `RenderError::RendererUnreachable`, with a hint to start
/// Storybook, if the request fails or is not answered with 2xx.
pub async fn ensure_storybook_running(storybook_url: &Url) -> Result<(), RenderError> {
    let client = reqwest::Client::builder()
        .timeout(REACHABILITY_TIMEOUT)
        .build()
        .map_err(|err| RenderError::RendererUnreachable(format!("cannot build HTTP client: {err}")))?;
    match client.get(storybook_url.clone()).send().await {
        Ok(response) if response.status().is_success() => {
            debug!("Storybook is up at {storybook_url}");
            Ok(())
        }
        Ok(response) => Err(RenderError::RendererUnreachable(format!(
            "Storybook at {storybook_url} answered {}; start Storybook first: npm run storybook",
            response.status()
        ))),
        Err(err) => Err(RenderError::RendererUnreachable(format!(
            "Storybook is not running at {storybook_url} ({err}); start Storybook first: npm run storybook"
        ))),
    }
}

/// The iframe url of a component story. A base path without a trailing `/`
/// is treated as a directory.
///
/// # Errors
///
/// Returns `RenderError::RendererUnreachable` if `base` cannot host the page.
pub fn story_url(base: &Url, component: &str, variant: &str) -> Result<Url, RenderError> {
    let mut root = base.clone();
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    let mut url = root
        .join("iframe.html")
        .map_err(|err| RenderError::RendererUnreachable(format!("bad Storybook url {base}: {err}")))?;
    url.query_pairs_mut()
        .append_pair("id", &format!("blocks-{component}--{variant}"))
        .append_pair("viewMode", "story");
    Ok(url)
}

/// Selector for a component's root element, most specific first.
pub fn element_selector(component: &str) -> String {
    format!(".{component}.block, .{component}, [data-block-name=\"{component}\"]")
}

/// Starts a headless Chrome instance.
///
/// # Errors
///
/// Returns `RenderError::RendererUnreachable` if the browser fails to launch.
async fn launch(chrome_bin: Option<&Path>) -> Result<ChromeSession, RenderError> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .window_size(DEFAULT_VIEWPORT.width, DEFAULT_VIEWPORT.height)
        .arg("--hide-scrollbars")
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--disable-sync")
        .arg("--force-color-profile=sRGB");
    if let Some(path) = chrome_bin {
        builder = builder.chrome_executable(path);
    }
    let config = builder
        .build()
        .map_err(|err| RenderError::RendererUnreachable(format!("browser config error: {err}")))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|err| RenderError::RendererUnreachable(format!("cannot launch Chrome: {err}")))?;

    let handler = spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(err) = event {
                debug!("browser event error: {err:?}");
            }
        }
    });
    info!("launched headless Chrome");

    Ok(ChromeSession { browser, handler })
}

async fn capture(
    page: &Page,
    url: &Url,
    component: &ComponentId,
    viewport: Viewport,
) -> Result<Vec<u8>, RenderError> {
    let metrics = SetDeviceMetricsOverrideParams::builder()
        .width(i64::from(viewport.width))
        .height(i64::from(viewport.height))
        .device_scale_factor(DEVICE_SCALE_FACTOR)
        .mobile(false)
        .build()
        .map_err(|err| RenderError::RendererUnreachable(format!("bad viewport params: {err}")))?;
    page.execute(metrics)
        .await
        .map_err(|err| RenderError::RendererUnreachable(format!("cannot set viewport: {err}")))?;

    debug!("navigating to {url}");
    match timeout(NAVIGATION_TIMEOUT, page.goto(url.as_str())).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => {
            return Err(RenderError::RendererUnreachable(format!(
                "navigation to {url} failed: {err}"
            )));
        }
        Err(_) => return Err(RenderError::Timeout(NAVIGATION_TIMEOUT)),
    }
    sleep(POST_LOAD_WAIT).await;

    let selector = element_selector(component.as_str());
    match page.find_element(selector.as_str()).await {
        Ok(element) => element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|err| RenderError::RendererUnreachable(format!("element screenshot failed: {err}"))),
        Err(err) => {
            info!("nothing matches `{selector}` ({err}), capturing the viewport");
            capture_viewport(page).await
        }
    }
}

async fn capture_viewport(page: &Page) -> Result<Vec<u8>, RenderError> {
    let params = CaptureScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .from_surface(true)
        .build();
    let response = page
        .execute(params)
        .await
        .map_err(|err| RenderError::RendererUnreachable(format!("screenshot failed: {err}")))?;
    let base64_str: &str = response.data.as_ref();
    BASE64_STANDARD
        .decode(base64_str)
        .map_err(|err| RenderError::MalformedRaster(format!("screenshot is not base64: {err}")))
}
