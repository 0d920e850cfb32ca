//! Selector tables keyed by (bookmaker, semantic target).
//!
//! Markup drift is handled by editing these lists, not code. The built-in
//! table can be extended or overridden with a JSON file shaped like
//! `{"sportsbet": {"market_container": [".new-market", ".market-group"]}}`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use super::cascade::Descriptor;
use crate::error::ScrapeError;

/// Semantic targets the extraction pipeline looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    // Event listing pages
    ListingGroup,
    ListingGroupName,
    ListingGroupLink,
    ListingLink,
    // Racing listing pages
    MeetingGroup,
    MeetingName,
    MeetingRaceLink,
    RaceLink,
    // Event pages
    EventName,
    Competition,
    StartTime,
    MarketContainer,
    MarketName,
    LiveIndicator,
    Outcome,
    OutcomeName,
    Price,
    // Race cards
    Runner,
    RunnerNumber,
    RunnerName,
    Jockey,
    WinPrice,
    PlacePrice,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

type RawTable = HashMap<String, HashMap<Target, Vec<String>>>;

/// Ordered descriptor lists per bookmaker and target
#[derive(Debug, Clone, Default)]
pub struct SelectorTable {
    entries: HashMap<String, HashMap<Target, Vec<Descriptor>>>,
}

impl SelectorTable {
    /// Table with the selectors shipped for the built-in bookmakers
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (target, sources) in SPORTSBET {
            table.set("sportsbet", *target, sources.iter().copied());
        }
        table
    }

    /// Built-in table with overrides from a JSON file applied on top
    pub fn builtin_with_overrides<P: AsRef<Path>>(path: P) -> Result<Self, ScrapeError> {
        let mut table = Self::builtin();
        table.load_overrides(path)?;
        Ok(table)
    }

    /// Replace descriptor lists with the ones found in a JSON file.
    pub fn load_overrides<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ScrapeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let raw: RawTable = serde_json::from_str(&content)?;

        let mut count = 0;
        for (bookmaker, targets) in raw {
            for (target, sources) in targets {
                self.set(&bookmaker, target, sources.iter().map(String::as_str));
                count += 1;
            }
        }
        info!("Loaded {} selector override(s) from {}", count, path.display());
        Ok(())
    }

    /// Set the descriptor list for a target. Selectors that fail to compile
    /// are logged and skipped so one typo does not disable the whole list.
    pub fn set<'s>(&mut self, bookmaker: &str, target: Target, sources: impl IntoIterator<Item = &'s str>) {
        let descriptors = sources
            .into_iter()
            .filter_map(|source| match Descriptor::parse(source) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!("Skipping selector for {}/{}: {}", bookmaker, target, e);
                    None
                }
            })
            .collect();

        self.entries
            .entry(bookmaker.to_string())
            .or_default()
            .insert(target, descriptors);
    }

    /// Descriptor list for a target; empty when nothing is configured
    pub fn strategy(&self, bookmaker: &str, target: Target) -> &[Descriptor] {
        self.entries
            .get(bookmaker)
            .and_then(|targets| targets.get(&target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Borrow the table for one bookmaker
    pub fn for_bookmaker<'t>(&'t self, bookmaker: &'t str) -> Selectors<'t> {
        Selectors {
            table: self,
            bookmaker,
        }
    }

    pub fn has_bookmaker(&self, bookmaker: &str) -> bool {
        self.entries.contains_key(bookmaker)
    }
}

/// Selector lists of a single bookmaker
#[derive(Debug, Clone, Copy)]
pub struct Selectors<'t> {
    table: &'t SelectorTable,
    bookmaker: &'t str,
}

impl<'t> Selectors<'t> {
    pub fn get(&self, target: Target) -> &'t [Descriptor] {
        self.table.strategy(self.bookmaker, target)
    }

    /// Bookmaker id these selectors belong to
    pub fn bookmaker(&self) -> &'t str {
        self.bookmaker
    }
}

/// Sportsbet selectors, most specific first
const SPORTSBET: &[(Target, &[&str])] = &[
    (
        Target::ListingGroup,
        &[
            ".competition-container",
            ".soccer-competition",
            "[data-automation-id*='competition']",
            ".classified-list",
            ".competition-markets",
        ],
    ),
    (
        Target::ListingGroupName,
        &[".competition-name", "h2", "h3", ".header"],
    ),
    (
        Target::ListingGroupLink,
        &[
            "a.match-link",
            "a.event-link",
            "[data-automation-id*='event'] a",
            "a[href*='/event/'], a[href*='/match/'], a[href*='/soccer/'], a[href*='/sport/']",
        ],
    ),
    (
        Target::ListingLink,
        &[
            ".event-card a",
            "[data-automation-id*='event'] a",
            "a[href*='/event/']",
            "a[href*='/sport/']",
            ".market-container a",
            "a.event-link",
        ],
    ),
    (
        Target::MeetingGroup,
        &[
            ".meeting-item",
            "[data-automation-id*='meeting']",
            ".race-meeting",
            ".classified-list > div",
        ],
    ),
    (Target::MeetingName, &[".meeting-name", "h2", "h3"]),
    (
        Target::MeetingRaceLink,
        &["a[href*='race']", "a[href*='Race']"],
    ),
    (
        Target::RaceLink,
        &[
            "a[href*='race']",
            "a[href*='horse-racing']",
            ".race-card a",
            "[data-automation-id*='race'] a",
        ],
    ),
    (
        Target::EventName,
        &[
            "[data-automation-id*='event-name']",
            "[data-automation-id*='race-name']",
            ".event-name",
            "h1",
            "title",
        ],
    ),
    (
        Target::Competition,
        &[
            "[data-automation-id*='competition-name']",
            ".competition-name",
            ".breadcrumb li:last-child",
        ],
    ),
    (
        Target::StartTime,
        &[
            "time[datetime]",
            "[data-automation-id*='start-time']",
            "[data-automation-id*='time']",
            ".race-time",
            ".event-time",
            "time",
        ],
    ),
    (
        Target::MarketContainer,
        &[
            "[data-automation-id*='market']",
            ".market-container",
            ".market-group",
            ".betting-option",
        ],
    ),
    (
        Target::MarketName,
        &[
            "[data-automation-id*='market-name']",
            ".market-name",
            ".market-title",
            "h2, h3, h4, h5",
            "[data-automation-id*='title']",
        ],
    ),
    (
        Target::LiveIndicator,
        &["[data-automation-id*='live']", ".live-indicator", ".in-play"],
    ),
    (
        Target::Outcome,
        &[
            "[data-automation-id*='outcome']",
            ".outcome-button",
            ".price-button",
            ".betting-option",
        ],
    ),
    (
        Target::OutcomeName,
        &[
            "[data-automation-id*='outcome-name']",
            ".outcome-name",
            ".selection-name",
            "span:not(.price-text):not(.odds-text)",
        ],
    ),
    (
        Target::Price,
        &[
            "[data-automation-id*='price']",
            ".price-text",
            ".odds-text",
        ],
    ),
    (
        Target::Runner,
        &[
            "[data-automation-id*='runner']",
            ".runner-row",
            ".runner-item",
            ".betting-option-table tr",
        ],
    ),
    (
        Target::RunnerNumber,
        &["[data-automation-id*='number']", ".runner-number"],
    ),
    (
        Target::RunnerName,
        &[
            "[data-automation-id*='name']",
            ".runner-name",
            ".horse-name",
        ],
    ),
    (
        Target::Jockey,
        &["[data-automation-id*='jockey']", ".jockey-name"],
    ),
    (
        Target::WinPrice,
        &[
            "[data-automation-id*='win-price']",
            "[data-automation-id*='fixed-price']",
            ".win-price",
            ".fixed-price",
            ".price-button",
        ],
    ),
    (
        Target::PlacePrice,
        &["[data-automation-id*='place-price']", ".place-price"],
    ),
];
