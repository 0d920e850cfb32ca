//! Static HTML surface over plain HTTP.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::browser::{BrowsingSurface, PageSnapshot};
use crate::error::ScrapeError;

/// Fetches pages without rendering scripts
pub struct HttpSurface {
    client: reqwest::Client,
}

impl HttpSurface {
    pub fn new(user_agent: &str) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BrowsingSurface for HttpSurface {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<PageSnapshot, ScrapeError> {
        let timed_out = |e: reqwest::Error| {
            if e.is_timeout() {
                ScrapeError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                ScrapeError::Http(e)
            }
        };

        let response = self.client.get(url).timeout(timeout).send().await.map_err(timed_out)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(timed_out)?;
        debug!("Fetched {} bytes from {}", html.len(), url);

        Ok(PageSnapshot {
            url: url.to_string(),
            html,
        })
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        Ok(())
    }
}
