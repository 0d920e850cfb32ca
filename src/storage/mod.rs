//! Storage for scraping runs
//!
//! Each run is persisted as one JSON artifact in the output directory.

pub mod json_store;
pub mod schema;

pub use json_store::JsonStore;
pub use schema::{BookmakerRecord, EventRecord, MarketRecord, OutcomeRecord, ResultRecord};
