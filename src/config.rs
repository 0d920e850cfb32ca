//! Configuration for betscrape.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Headless browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome executable; platform default when unset
    #[serde(default)]
    pub chrome_path: Option<String>,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: default_user_agent(),
        }
    }
}

impl BrowserConfig {
    /// Configured executable, or the usual install location for this platform
    pub fn chrome_executable(&self) -> String {
        if let Some(path) = &self.chrome_path {
            return path.clone();
        }
        if cfg!(target_os = "macos") {
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".to_string()
        } else if cfg!(target_os = "windows") {
            "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe".to_string()
        } else {
            "google-chrome".to_string()
        }
    }
}

/// Traversal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Maximum sub-pages visited per run
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Minimum delay between consecutive visits
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Extra random delay on top of `pacing_ms`
    #[serde(default)]
    pub jitter_ms: u64,
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
    /// Wait after navigation for client-side rendering
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_max_items() -> usize {
    10
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_settle_ms() -> u64 {
    2000
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            pacing_ms: default_pacing_ms(),
            jitter_ms: 0,
            navigation_timeout_ms: default_navigation_timeout_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl ScraperConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Per-item debug dumps are written here when set
    #[serde(default)]
    pub debug_dir: Option<String>,
}

fn default_output_dir() -> String {
    "output".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            debug_dir: None,
        }
    }
}

/// Selector table configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// JSON file overriding the built-in selector lists
    #[serde(default)]
    pub table_file: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional `betscrape` file and
    /// the environment
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("betscrape")
    }

    /// Same as [`AppConfig::load`] with an explicit config file stem
    pub fn load_from(file: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name(file).required(false))
            // Override with environment variables (BETSCRAPE_SCRAPER__MAX_ITEMS, etc.)
            .add_source(
                config::Environment::with_prefix("BETSCRAPE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
