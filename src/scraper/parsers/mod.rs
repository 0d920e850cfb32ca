//! HTML fragment parsers for bookmaker pages.
//!
//! Parsers are synchronous: they take a rendered HTML snapshot and return
//! owned fragments, so no DOM handle outlives the call.

pub mod event_page;
pub mod listing;
pub mod race_card;

pub use event_page::EventPageParser;
pub use listing::{CandidateRef, ListingParser, ListingTargets};
pub use race_card::{RaceCardParser, Runner};
