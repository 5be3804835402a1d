// src/browser/chromium.rs
use super::{BrowserLauncher, BrowserSession};
use crate::error::ScrapeError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Launches a local Chrome/Chromium over the DevTools protocol.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
}

impl ChromiumLauncher {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let builder = CdpConfig::builder();
        let builder = if self.headless {
            builder
        } else {
            builder.with_head()
        };
        let config = builder.build().map_err(ScrapeError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        // The CDP connection only makes progress while the handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(ScrapeError::Launch(e.to_string()));
            }
        };

        info!("Browser session started (headless: {})", self.headless);
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler,
        }))
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    async fn element(&self, element_id: &str) -> Result<Element, ScrapeError> {
        self.page
            .find_element(format!("[id=\"{}\"]", element_id))
            .await
            .map_err(|e| ScrapeError::ElementNotFound {
                id: element_id.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&mut self, url: &str) -> Result<(), ScrapeError> {
        debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn fill(&mut self, element_id: &str, value: &str) -> Result<(), ScrapeError> {
        let element = self.element(element_id).await?;
        element
            .click()
            .await
            .map_err(|e| interaction(element_id, e))?
            .type_str(value)
            .await
            .map_err(|e| interaction(element_id, e))?;
        Ok(())
    }

    async fn submit(&mut self, element_id: &str) -> Result<(), ScrapeError> {
        let element = self.element(element_id).await?;
        element
            .press_key("Enter")
            .await
            .map_err(|e| interaction(element_id, e))?;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, ScrapeError> {
        self.page
            .content()
            .await
            .map_err(|e| ScrapeError::Content(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        let mut this = *self;
        this.browser
            .close()
            .await
            .map_err(|e| ScrapeError::Close(e.to_string()))?;
        if let Err(e) = this.browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        info!("Browser session closed");
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Browser's own Drop kills the child process.
        self.handler.abort();
    }
}

fn interaction(element_id: &str, e: chromiumoxide::error::CdpError) -> ScrapeError {
    ScrapeError::Interaction {
        id: element_id.to_string(),
        reason: e.to_string(),
    }
}
