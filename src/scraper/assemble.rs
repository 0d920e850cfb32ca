//! Event assembly.
//!
//! Stitches the fragments resolved from one page into a single [`Event`]:
//! participants are split from the name, prices are validated, markets are
//! classified, and empty markets are dropped. An event without any
//! surviving market is an extraction failure and yields `None`.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::classify::{classify, default_market_name};
use super::normalize::{clean_text, parse_price, parse_start_time, slugify};
use crate::types::{Bookmaker, Event, EventHeader, Market, Outcome, SportType};

/// Separators tried in order when splitting an event name
const PARTICIPANT_SEPARATORS: &[&str] = &[" v ", " vs ", " - ", "vs.", "v."];

/// A single selection as captured from the page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeFragment {
    pub name: Option<String>,
    pub price: Option<String>,
}

impl OutcomeFragment {
    pub fn new(name: Option<String>, price: Option<String>) -> Self {
        Self { name, price }
    }
}

/// A market as captured from the page, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketFragment {
    pub label: Option<String>,
    pub outcomes: Vec<OutcomeFragment>,
    pub is_live: bool,
}

/// Everything resolved from one event or race page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFragments {
    pub name: Option<String>,
    pub competition: Option<String>,
    pub start_time: Option<String>,
    pub markets: Vec<MarketFragment>,
}

/// Split an event name into (home, away).
///
/// Falls back to `(name, "")` for single-participant events.
pub fn split_name(name: &str) -> (String, String) {
    for separator in PARTICIPANT_SEPARATORS {
        let parts: Vec<&str> = name.split(separator).map(str::trim).collect();
        if parts.len() == 2 && parts.iter().all(|p| !p.is_empty()) {
            return (clean_text(parts[0]), clean_text(parts[1]));
        }
    }
    (clean_text(name), String::new())
}

/// Deterministic event id: bookmaker id plus the last non-empty URL path
/// segment. Query strings and fragments are ignored.
pub fn event_id(bookmaker_id: &str, url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
            .or_else(|| parsed.host_str().map(str::to_string)),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.split('/').filter(|s| !s.is_empty()).last())
            .map(str::to_string),
    };

    format!("{}_{}", bookmaker_id, segment.unwrap_or_else(|| "index".to_string()))
}

/// Builds events for one bookmaker
#[derive(Debug, Clone)]
pub struct EventAssembler {
    bookmaker: Arc<Bookmaker>,
}

impl EventAssembler {
    pub fn new(bookmaker: Arc<Bookmaker>) -> Self {
        Self { bookmaker }
    }

    pub fn bookmaker(&self) -> &Arc<Bookmaker> {
        &self.bookmaker
    }

    /// Assemble an event stamped with the current time
    pub fn assemble(&self, fragments: EventFragments, url: &str, sport: SportType) -> Option<Event> {
        self.assemble_at(fragments, url, sport, Utc::now())
    }

    /// Assemble an event using `now` as the extraction time
    pub fn assemble_at(
        &self,
        fragments: EventFragments,
        url: &str,
        sport: SportType,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        let markets: Vec<Market> = fragments
            .markets
            .into_iter()
            .enumerate()
            .filter_map(|(index, fragment)| build_market(index, fragment))
            .collect();

        if markets.is_empty() {
            warn!("No valid markets for {}", url);
            return None;
        }

        let name = fragments
            .name
            .map(|n| clean_text(&n))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown Event".to_string());
        // A race card has a single participant: the race itself
        let (home_team, away_team) = if sport == SportType::HorseRacing {
            (name, String::new())
        } else {
            split_name(&name)
        };

        let resolved_start = fragments
            .start_time
            .as_deref()
            .and_then(|raw| parse_start_time(raw, now));
        if resolved_start.is_none() {
            debug!("No start time for {}, using extraction time", url);
        }

        let header = EventHeader {
            id: event_id(&self.bookmaker.id, url),
            sport,
            home_team,
            away_team,
            competition: fragments
                .competition
                .map(|c| clean_text(&c))
                .unwrap_or_default(),
            start_time: resolved_start.unwrap_or(now),
            start_time_resolved: resolved_start.is_some(),
            url: url.to_string(),
            created_at: now,
        };

        Event::new(header, markets, self.bookmaker.clone())
    }
}

/// Validate a market fragment; `None` when no outcome survives.
fn build_market(index: usize, fragment: MarketFragment) -> Option<Market> {
    let outcomes: Vec<Outcome> = fragment
        .outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(position, outcome)| {
            let odds = parse_price(outcome.price.as_deref()?)?;
            let name = outcome
                .name
                .map(|n| clean_text(&n))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Selection {}", position + 1));
            Outcome::new(name, odds).ok()
        })
        .collect();

    let label = fragment
        .label
        .map(|l| clean_text(&l))
        .filter(|l| !l.is_empty() && l != "Unknown" && l != "Unknown Market");
    let market_type = classify(label.as_deref().unwrap_or(""), outcomes.len());
    let name = label.unwrap_or_else(|| default_market_name(market_type).to_string());
    let id = format!("{}_{}", slugify(&name), index);

    let market = Market::new(id, market_type, name, outcomes, fragment.is_live);
    if market.is_none() {
        debug!("Dropping market #{} with no valid outcomes", index);
    }
    market
}
