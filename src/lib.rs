//! betscrape: odds extraction from bookmaker web pages.
//!
//! Pages are rendered (or fetched), reduced to raw fragments by
//! selector cascades, then normalized into validated events.

pub mod cli;
pub mod config;
pub mod error;
pub mod scraper;
pub mod storage;
pub mod types;

pub use error::{ModelError, ScrapeError, SportFailure};
pub use types::{
    ArbitrageOpportunity, ArbitrageSelection, Bookmaker, Event, Market, MarketType, Outcome, ScrapingResult,
    SportType,
};
