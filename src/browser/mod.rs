//! Browser automation for pages that only render behind a login.
//!
//! The flow in [`LinkedInScraper`] talks to a [`BrowserSession`]; the
//! chromium implementation lives in [`chromium`].

use crate::error::ScrapeError;
use async_trait::async_trait;

pub mod chromium;
pub mod flow;
pub mod text;

pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use flow::LinkedInScraper;
pub use text::page_text;

/// One live browser tab with its own cookies.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait for the page load.
    async fn goto(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Type `value` into the element with the given `id`.
    async fn fill(&mut self, element_id: &str, value: &str) -> Result<(), ScrapeError>;

    /// Press Enter inside the element with the given `id`.
    async fn submit(&mut self, element_id: &str) -> Result<(), ScrapeError>;

    /// Fully rendered markup of the current page.
    async fn page_source(&mut self) -> Result<String, ScrapeError>;

    /// Close the session and release the browser.
    async fn close(self: Box<Self>) -> Result<(), ScrapeError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError>;
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub url: String,
    pub html: String,
}

impl ScrapedPage {
    pub fn text(&self) -> String {
        page_text(&self.html)
    }
}
