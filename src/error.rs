//! Error types.
//!
//! `ScrapeError` follows the extraction taxonomy: fragment-level variants
//! (`NotFound`, `InvalidValue`), item-level variants (`NavigationTimeout`, `Navigation`,
//! `EmptyResult`, HTTP failures) and run-level variants (`Browser`,
//! `Cancelled`, `RunFailure`). Only run-level errors are allowed to reach
//! the run boundary; everything else is logged and absorbed where it happens.

use thiserror::Error;

use crate::types::Event;

/// Errors raised while driving a browsing surface or extracting a page
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("no element matched target {target}")]
    NotFound { target: String },

    #[error("invalid value '{raw}': {reason}")]
    InvalidValue { raw: String, reason: &'static str },

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no valid markets extracted from {url}")]
    EmptyResult { url: String },

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("run cancelled")]
    Cancelled,

    #[error("run failed: {0}")]
    RunFailure(String),
}

impl ScrapeError {
    /// Whether this error only invalidates a single item (fragment or page)
    /// rather than the whole run.
    pub fn is_item_level(&self) -> bool {
        !matches!(
            self,
            ScrapeError::Browser(_) | ScrapeError::Cancelled | ScrapeError::RunFailure(_)
        )
    }
}

/// A sport stopped by a run-level error, with the events it had already
/// extracted
#[derive(Error, Debug)]
#[error("{error}")]
pub struct SportFailure {
    pub events: Vec<Event>,
    pub error: ScrapeError,
}

impl From<ScrapeError> for SportFailure {
    fn from(error: ScrapeError) -> Self {
        Self {
            events: Vec::new(),
            error,
        }
    }
}

/// Violations of data-model invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("odds must be a finite decimal above 1.0, got {0}")]
    InvalidOdds(f64),

    #[error("selection '{selection}' pays {payout:.2} against an investment of {investment:.2}")]
    NegativeReturn {
        selection: String,
        payout: f64,
        investment: f64,
    },

    #[error("unknown sport '{0}'")]
    UnknownSport(String),
}
