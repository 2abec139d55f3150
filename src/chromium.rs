//! Headless Chromium rendering engine over the DevTools protocol.

use crate::engine::{CommandOutcome, DocumentCommand, RenderEngine, RenderSession};
use crate::size::Size;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::{
    GetDocumentParams, QuerySelectorParams, SetAttributeValueParams,
};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Launch timeout for the Chromium process.
const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Launches one headless Chromium per session.
#[derive(Debug, Clone)]
pub struct ChromiumEngine {
    launch_timeout: Duration,
    no_sandbox: bool,
}

impl ChromiumEngine {
    pub fn new() -> Self {
        Self {
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
            no_sandbox: false,
        }
    }

    pub fn with_launch_timeout(mut self, timeout: Duration) -> Self {
        self.launch_timeout = timeout;
        self
    }

    /// Disables the Chromium sandbox, required when running as root in
    /// most containers.
    pub fn with_no_sandbox(mut self, no_sandbox: bool) -> Self {
        self.no_sandbox = no_sandbox;
        self
    }

    fn config(&self, executable: &Path) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .launch_timeout(self.launch_timeout)
            .arg("--hide-scrollbars");
        if self.no_sandbox {
            builder = builder.no_sandbox();
        }
        builder
            .build()
            .map_err(|e| anyhow!("invalid browser configuration: {}", e))
    }
}

impl Default for ChromiumEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn launch(&self, executable: &Path) -> Result<Box<dyn RenderSession>> {
        let config = self.config(executable)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to start Chromium")?;

        // The handler stream drives all DevTools traffic for this browser.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!("Chromium handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // Release the half-started process before reporting.
                shutdown_browser(&mut browser, handler_task).await;
                return Err(anyhow::Error::new(e).context("Failed to open page"));
            }
        };

        debug!(executable = %executable.display(), "Chromium session opened");
        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
        }))
    }
}

/// A live Chromium process with one page.
pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page> {
        self.page.as_ref().context("Chromium session is already closed")
    }
}

/// `DOM.querySelector("svg")` then `DOM.setAttributeValue`; no script evaluation.
async fn set_root_svg_attribute(page: &Page, name: &str, value: &str) -> Result<CommandOutcome> {
    let document = page
        .execute(GetDocumentParams::default())
        .await
        .context("DOM.getDocument failed")?;
    let found = page
        .execute(QuerySelectorParams::new(
            document.result.root.node_id.clone(),
            "svg",
        ))
        .await
        .context("DOM.querySelector failed")?;

    // Chromium answers a selector miss with node id 0.
    let node_id = found.result.node_id.clone();
    if *node_id.inner() == 0 {
        return Ok(CommandOutcome::TargetMissing);
    }

    page.execute(SetAttributeValueParams::new(node_id, name, value))
        .await
        .with_context(|| format!("DOM.setAttributeValue {}={} failed", name, value))?;
    Ok(CommandOutcome::Applied)
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn load_document(&mut self, html: &str) -> Result<()> {
        self.page()?
            .set_content(html)
            .await
            .context("Failed to set page content")?;
        Ok(())
    }

    async fn set_viewport(&mut self, size: Size) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(size.width),
            i64::from(size.height),
            1.0,
            false,
        );
        self.page()?
            .execute(params)
            .await
            .with_context(|| format!("Failed to resize viewport to {}", size))?;
        Ok(())
    }

    async fn apply(&mut self, command: &DocumentCommand) -> Result<CommandOutcome> {
        match command {
            DocumentCommand::SetRootSvgAttribute { name, value } => {
                set_root_svg_attribute(self.page()?, name, value).await
            }
        }
    }

    async fn capture_png(&mut self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .omit_background(true)
            .build();
        let bytes = self
            .page()?
            .save_screenshot(params, path)
            .await
            .with_context(|| format!("Failed to write screenshot to {}", path.display()))?;
        trace!(path = %path.display(), bytes = bytes.len(), "Screenshot saved");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let page_result = match self.page.take() {
            Some(page) => page.close().await.context("Failed to close page"),
            None => Ok(()),
        };

        let browser_result = match self.browser.take() {
            Some(mut browser) => close_browser(&mut browser).await,
            None => Ok(()),
        };
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        // A browser shutdown failure outranks a page close failure.
        browser_result.and(page_result)
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        if self.browser.is_some() {
            // chromiumoxide kills the child process when `Browser` drops.
            warn!("Chromium session dropped without close; killing process");
        }
    }
}

async fn close_browser(browser: &mut Browser) -> Result<()> {
    browser
        .close()
        .await
        .context("Failed to send Browser.close")?;
    browser
        .wait()
        .await
        .context("Failed to wait for Chromium to exit")?;
    Ok(())
}

/// Best-effort shutdown used when a launch fails halfway.
async fn shutdown_browser(browser: &mut Browser, handler_task: JoinHandle<()>) {
    if let Err(e) = close_browser(browser).await {
        warn!("Failed to close partially launched Chromium: {:#}", e);
        if let Some(Err(e)) = browser.kill().await {
            warn!("Failed to kill Chromium: {}", e);
        }
    }
    handler_task.abort();
}
