//! Race card parser.
//!
//! Reads runner rows and synthesises WIN, PLACE and EACH WAY market
//! fragments from their win and place prices.

use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;
use tracing::debug;

use super::event_page::resolve_start_time;
use crate::scraper::assemble::{EventFragments, MarketFragment, OutcomeFragment};
use crate::scraper::cascade::{require_text, resolve, resolve_text};
use crate::scraper::normalize::{clean_event_title, leading_number, parse_price, race_number};
use crate::scraper::selectors::{Selectors, Target};

/// One runner row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Runner {
    pub number: u32,
    pub name: String,
    pub jockey: Option<String>,
    pub win_price: Option<String>,
    pub place_price: Option<String>,
}

impl Runner {
    /// "3. Fast Horse (J. Smith)"
    pub fn outcome_name(&self) -> String {
        match &self.jockey {
            Some(jockey) => format!("{}. {} ({})", self.number, self.name, jockey),
            None => format!("{}. {}", self.number, self.name),
        }
    }

    fn has_win(&self) -> bool {
        self.win_price.as_deref().and_then(parse_price).is_some()
    }

    fn has_place(&self) -> bool {
        self.place_price.as_deref().and_then(parse_price).is_some()
    }
}

/// Parser for horse race pages
pub struct RaceCardParser;

impl RaceCardParser {
    /// Parse a race page into event fragments
    pub fn parse(html: &str, selectors: Selectors<'_>, url: &str) -> EventFragments {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let title = require_text(&root, selectors.get(Target::EventName), Target::EventName)
            .inspect_err(|e| debug!("{}", e))
            .ok()
            .map(|t| clean_event_title(&t, selectors.bookmaker()));
        let name = race_name(title.as_deref(), url);
        let competition = resolve_text(&root, selectors.get(Target::Competition));
        let start_time = resolve_start_time(&root, selectors);

        let runners = collect_runners(&root, selectors);
        debug!("Parsed {} runner(s) from {}", runners.len(), url);

        EventFragments {
            name,
            competition,
            start_time,
            markets: Self::build_markets(&runners),
        }
    }

    /// Runner rows in page order
    pub fn parse_runners(html: &str, selectors: Selectors<'_>) -> Vec<Runner> {
        let document = Html::parse_document(html);
        collect_runners(&document.root_element(), selectors)
    }

    fn build_markets(runners: &[Runner]) -> Vec<MarketFragment> {
        let win: Vec<OutcomeFragment> = runners
            .iter()
            .filter(|r| r.win_price.is_some())
            .map(|r| OutcomeFragment::new(Some(r.outcome_name()), r.win_price.clone()))
            .collect();
        let place: Vec<OutcomeFragment> = runners
            .iter()
            .filter(|r| r.place_price.is_some())
            .map(|r| OutcomeFragment::new(Some(r.outcome_name()), r.place_price.clone()))
            .collect();

        let mut markets = Vec::new();
        let each_way = runners.iter().any(Runner::has_win) && runners.iter().any(Runner::has_place);

        if !win.is_empty() {
            markets.push(market("Win", win.clone()));
        }
        if !place.is_empty() {
            markets.push(market("Place", place));
        }
        // Each way carries the win prices; the place leg is priced separately
        if each_way {
            markets.push(market("Each Way", win));
        }
        markets
    }
}

fn collect_runners(root: &ElementRef<'_>, selectors: Selectors<'_>) -> Vec<Runner> {
    resolve(root, selectors.get(Target::Runner))
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let number = resolve_text(row, selectors.get(Target::RunnerNumber))
                .and_then(|n| leading_number(&n))
                .unwrap_or(index as u32 + 1);

            Runner {
                number,
                name: resolve_text(row, selectors.get(Target::RunnerName))
                    .unwrap_or_else(|| "Unknown Runner".to_string()),
                jockey: resolve_text(row, selectors.get(Target::Jockey)),
                win_price: resolve_text(row, selectors.get(Target::WinPrice)),
                place_price: resolve_text(row, selectors.get(Target::PlacePrice)),
            }
        })
        .collect()
}

fn market(label: &str, outcomes: Vec<OutcomeFragment>) -> MarketFragment {
    MarketFragment {
        label: Some(label.to_string()),
        outcomes,
        is_live: false,
    }
}

/// Race name from the page title, prefixed with "Race N - " when the number
/// is known and the title does not already lead with it.
fn race_name(title: Option<&str>, url: &str) -> Option<String> {
    static URL_RACE: OnceLock<Regex> = OnceLock::new();
    let url_race = URL_RACE.get_or_init(|| Regex::new(r"(?i)/race-(\d+)(?:[/?#]|$)").expect("static regex"));

    let number = title
        .and_then(race_number)
        .or_else(|| url_race.captures(url).and_then(|caps| caps[1].parse().ok()));

    let base = title
        .map(|t| t.split(" - ").next().unwrap_or(t).trim().to_string())
        .filter(|t| !t.is_empty());

    match (number, base) {
        (Some(n), Some(base)) if race_number(&base) == Some(n) => Some(base),
        (Some(n), Some(base)) => Some(format!("Race {} - {}", n, base)),
        (Some(n), None) => Some(format!("Race {}", n)),
        (None, base) => base,
    }
}
