//! Event page parser.
//!
//! Resolves name, competition, start time and markets from a rendered
//! event page. Market containers and outcomes each have a fallback that
//! works from price elements alone, for pages where the container markup
//! has drifted but prices are still recognisable.

use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::debug;

use crate::scraper::assemble::{EventFragments, MarketFragment, OutcomeFragment};
use crate::scraper::cascade::{attribute_of, require_text, resolve, resolve_text, text_of};
use crate::scraper::normalize::clean_event_title;
use crate::scraper::selectors::{Selectors, Target};

/// How many ancestors to climb from a price looking for its market
const MAX_CONTAINER_DEPTH: usize = 3;

/// Parser for match/event pages
pub struct EventPageParser;

impl EventPageParser {
    /// Parse all fragments of an event page
    pub fn parse(html: &str, selectors: Selectors<'_>) -> EventFragments {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let name = require_text(&root, selectors.get(Target::EventName), Target::EventName)
            .inspect_err(|e| debug!("{}", e))
            .ok()
            .map(|n| clean_event_title(&n, selectors.bookmaker()))
            .filter(|n| !n.is_empty());
        let competition = resolve_text(&root, selectors.get(Target::Competition));
        let start_time = resolve_start_time(&root, selectors);

        let mut containers = resolve(&root, selectors.get(Target::MarketContainer));
        if containers.is_empty() {
            containers = containers_from_prices(&root, selectors);
            debug!("Inferred {} market container(s) from prices", containers.len());
        }

        let markets = containers
            .iter()
            .map(|container| Self::parse_market(container, selectors))
            .filter(|market| !market.outcomes.is_empty())
            .collect();

        EventFragments {
            name,
            competition,
            start_time,
            markets,
        }
    }

    fn parse_market(container: &ElementRef<'_>, selectors: Selectors<'_>) -> MarketFragment {
        let label = resolve_text(container, selectors.get(Target::MarketName));
        let is_live = !resolve(container, selectors.get(Target::LiveIndicator)).is_empty();

        let mut outcome_elements = resolve(container, selectors.get(Target::Outcome));
        if outcome_elements.is_empty() {
            // Each price's parent stands in for the outcome
            outcome_elements = resolve(container, selectors.get(Target::Price))
                .iter()
                .filter_map(|price| price.parent().and_then(ElementRef::wrap))
                .collect();
        }

        let outcomes = outcome_elements
            .iter()
            .map(|outcome| {
                OutcomeFragment::new(
                    resolve_text(outcome, selectors.get(Target::OutcomeName)),
                    resolve_text(outcome, selectors.get(Target::Price)),
                )
            })
            .collect();

        MarketFragment {
            label,
            outcomes,
            is_live,
        }
    }
}

/// Start time from a `datetime` attribute, falling back to element text
pub(crate) fn resolve_start_time(root: &ElementRef<'_>, selectors: Selectors<'_>) -> Option<String> {
    let element = resolve(root, selectors.get(Target::StartTime)).into_iter().next()?;
    attribute_of(&element, "datetime").or_else(|| Some(text_of(&element)).filter(|t| !t.is_empty()))
}

/// Walk up from each price to the nearest ancestor holding more than two
/// elements; each distinct ancestor is treated as a market container.
fn containers_from_prices<'a>(root: &ElementRef<'a>, selectors: Selectors<'_>) -> Vec<ElementRef<'a>> {
    let mut seen = HashSet::new();
    let mut containers = Vec::new();

    for price in resolve(root, selectors.get(Target::Price)) {
        let mut current = price.parent().and_then(ElementRef::wrap);
        for _ in 0..MAX_CONTAINER_DEPTH {
            let Some(element) = current else { break };
            let child_elements = element.children().filter(|c| c.value().is_element()).count();
            if child_elements > 2 {
                if seen.insert(element.id()) {
                    containers.push(element);
                }
                break;
            }
            current = element.parent().and_then(ElementRef::wrap);
        }
    }

    containers
}
