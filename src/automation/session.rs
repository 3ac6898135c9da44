//! One exclusively-owned live browsing context.
//!
//! An [`AutomationSession`] pairs a launched browser process with a
//! single page and the CDP event-drain task. It is never shared between
//! bot instances; dropping one without [`AutomationSession::close`]
//! leaks a Chromium process, so the owning instance tears the old
//! session down before ever opening a replacement.

use chromiumoxide::Browser;
use futures::StreamExt;
use std::path::Path;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::browser::{build_session_config, find_chrome_executable};
use super::driver::PageDriver;
use super::error::{BotError, Result};

pub struct AutomationSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    driver: PageDriver,
}

impl AutomationSession {
    /// Launch a fresh browser and open its single working page.
    pub async fn launch(headless: bool, snapshot_dir: &Path) -> Result<Self> {
        let exe = find_chrome_executable().ok_or_else(|| {
            BotError::Driver(
                "no Chromium-family browser found; install Chrome/Chromium or set CHROME_EXECUTABLE"
                    .to_string(),
            )
        })?;

        let config = build_session_config(&exe, headless)
            .map_err(|e| BotError::Driver(e.to_string()))?;

        info!("launching browser session ({}, headless={})", exe, headless);
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BotError::Driver(format!("browser launch failed ({}): {}", exe, e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("CDP handler error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BotError::Driver(format!("failed to open page: {}", e)))?;

        Ok(Self {
            browser,
            handler_task,
            driver: PageDriver::new(page, snapshot_dir),
        })
    }

    pub fn driver(&self) -> &PageDriver {
        &self.driver
    }

    /// Explicit resource release: close the browsing context, stop the
    /// underlying driver process, abort the event drain.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            error!("browser close error (non-fatal): {}", e);
        }
        self.handler_task.abort();
        info!("browser session closed");
    }
}
