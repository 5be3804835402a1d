// src/browser/flow.rs
use super::{BrowserLauncher, BrowserSession, Credentials, ScrapedPage};
use crate::config::BrowserConfig;
use crate::error::ScrapeError;
use std::time::Duration;
use tracing::{error, info, warn};

/// Logs in through the LinkedIn form and captures one page.
pub struct LinkedInScraper {
    login_url: String,
    username_field: String,
    password_field: String,
    settle: Duration,
}

impl LinkedInScraper {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            login_url: config.login_url.clone(),
            username_field: config.username_field.clone(),
            password_field: config.password_field.clone(),
            settle: config.settle(),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Launch a session, log in, open `target_url` and return its markup.
    ///
    /// The session is closed whether or not the flow succeeds. A close
    /// failure after a failed flow is logged and the flow error returned.
    /// If the future is dropped or the flow panics, teardown falls to the
    /// session's `Drop`.
    pub async fn scrape(
        &self,
        launcher: &dyn BrowserLauncher,
        credentials: &Credentials,
        target_url: &str,
    ) -> Result<ScrapedPage, ScrapeError> {
        if credentials.username.is_empty() {
            return Err(ScrapeError::MissingCredential("username"));
        }
        if credentials.password.is_empty() {
            return Err(ScrapeError::MissingCredential("password"));
        }

        let mut session = launcher.launch().await?;
        let outcome = self.drive(session.as_mut(), credentials, target_url).await;
        let closed = session.close().await;

        match (outcome, closed) {
            (Ok(html), Ok(())) => {
                info!("Captured {} bytes from {}", html.len(), target_url);
                Ok(ScrapedPage {
                    url: target_url.to_string(),
                    html,
                })
            }
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(e), Ok(())) => {
                error!("Scrape of {} failed: {}", target_url, e);
                Err(e)
            }
            (Err(e), Err(close_err)) => {
                error!("Scrape of {} failed: {}", target_url, e);
                warn!("Session teardown also failed: {}", close_err);
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        credentials: &Credentials,
        target_url: &str,
    ) -> Result<String, ScrapeError> {
        info!("Opening login page: {}", self.login_url);
        session.goto(&self.login_url).await?;
        session
            .fill(&self.username_field, &credentials.username)
            .await?;
        session
            .fill(&self.password_field, &credentials.password)
            .await?;
        session.submit(&self.password_field).await?;

        if !self.settle.is_zero() {
            info!("Waiting {:?} for login to settle", self.settle);
            tokio::time::sleep(self.settle).await;
        }

        info!("Navigating to target: {}", target_url);
        session.goto(target_url).await?;
        session.page_source().await
    }
}
