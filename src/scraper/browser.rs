//! Browsing surfaces.
//!
//! A surface turns a URL into a rendered HTML snapshot. Extraction never
//! talks to the browser directly: it parses the snapshot, so the same
//! parsers serve both the headless Chrome surface and the plain HTTP one.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig as ChromeConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::error::ScrapeError;

/// Rendered page content
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

/// Something that can load pages
#[async_trait]
pub trait BrowsingSurface: Send + Sync {
    /// Load `url` and return its rendered HTML, bounded by `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<PageSnapshot, ScrapeError>;

    /// Release the underlying resources
    async fn close(&self) -> Result<(), ScrapeError>;
}

/// Upper bound on shutting the browser down
const BROWSER_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run one browsing step for `url`, giving up with `NavigationTimeout`
/// once `timeout` elapses
async fn bounded<F: Future>(url: &str, timeout: Duration, step: F) -> Result<F::Output, ScrapeError> {
    tokio::time::timeout(timeout, step)
        .await
        .map_err(|_| ScrapeError::NavigationTimeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
}

async fn close_page(page: Page, url: &str, timeout: Duration) {
    match bounded(url, timeout, page.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Failed to close page for {}: {}", url, e),
        Err(e) => warn!("Closing page: {}", e),
    }
}

struct Session {
    browser: ChromeBrowser,
    handle: JoinHandle<()>,
}

/// Headless Chrome driven through chromiumoxide
pub struct ChromeSurface {
    session: Mutex<Option<Session>>,
    settle: Duration,
}

impl ChromeSurface {
    /// Launch a new headless browser instance
    pub async fn launch(config: &BrowserConfig, settle: Duration) -> Result<Self, ScrapeError> {
        let mut builder = ChromeConfig::builder()
            .chrome_executable(config.chrome_executable())
            .no_sandbox()
            .disable_default_args()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .arg(format!("--user-agent={}", config.user_agent))
            .window_size(config.window_width, config.window_height);
        if config.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }

        let chrome_config = builder
            .build()
            .map_err(|e| ScrapeError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = ChromeBrowser::launch(chrome_config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to launch browser: {}", e)))?;

        // The handler must keep running for the browser to respond
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        info!("Launched Chrome ({})", config.chrome_executable());
        Ok(Self {
            session: Mutex::new(Some(Session { browser, handle })),
            settle,
        })
    }
}

#[async_trait]
impl BrowsingSurface for ChromeSurface {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<PageSnapshot, ScrapeError> {
        let guard = self.session.lock().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| ScrapeError::Browser("browser already closed".to_string()))?;

        // A fresh page per navigation so no state leaks between items
        let page = bounded(url, timeout, session.browser.new_page("about:blank"))
            .await?
            .map_err(|e| ScrapeError::Browser(format!("Failed to create new page: {}", e)))?;

        let navigation = bounded(url, timeout, page.goto(url))
            .await
            .map(|result| result.map(|_| ()));
        match navigation {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                close_page(page, url, timeout).await;
                return Err(ScrapeError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
            // Whatever has rendered so far is still worth reading
            Err(e) => warn!("{}, reading partial page", e),
        }

        tokio::time::sleep(self.settle).await;

        let content = bounded(url, timeout, page.content()).await;
        close_page(page, url, timeout).await;

        match content? {
            Ok(html) => Ok(PageSnapshot {
                url: url.to_string(),
                html,
            }),
            Err(e) => Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: format!("failed to read page content: {}", e),
            }),
        }
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        let Some(mut session) = self.session.lock().await.take() else {
            return Ok(());
        };
        let result = tokio::time::timeout(BROWSER_CLOSE_TIMEOUT, session.browser.close()).await;
        session.handle.abort();
        match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::Browser(format!("Failed to close browser: {}", e))),
            Err(_) => Err(ScrapeError::Browser(format!(
                "browser did not close within {}s",
                BROWSER_CLOSE_TIMEOUT.as_secs()
            ))),
        }
    }
}
