//! Browser session lifecycle.
//!
//! One query owns one browser. The session launches Chromium over the
//! DevTools protocol, drives a single page, and tears the process down on
//! every exit path, including cancellation.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::error::{Error, Result};

/// A launched browser with one open page.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    /// Launch Chromium and open a blank page.
    pub async fn launch(config: &QueryConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .window_size(1280, 900);
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(Error::browser)?;

        // The CDP event stream must be drained for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(Error::browser)?;

        debug!(headless = config.headless, "browser launched");
        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    /// The session's page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate to `url` and wait for the load to settle, bounded by `timeout`.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let nav = async {
            self.page.goto(url).await.map_err(Error::browser)?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(Error::browser)?;
            Ok::<(), Error>(())
        };
        match tokio::time::timeout(timeout, nav).await {
            Ok(Ok(())) => {
                debug!(url, "navigation complete");
                Ok(())
            }
            Ok(Err(err)) => Err(Error::Navigation(err.to_string())),
            Err(_) => Err(Error::Navigation(format!(
                "{url} did not become ready within {}ms",
                timeout.as_millis()
            ))),
        }
    }

    /// Close the browser. Failures are logged, never escalated.
    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "browser close failed");
        }
        self.handler.abort();
    }
}

impl Drop for BrowserSession {
    // Browser's own Drop kills the child process; only the handler task
    // needs stopping here.
    fn drop(&mut self) {
        self.handler.abort();
    }
}
