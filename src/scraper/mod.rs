//! Bookmaker page scraping.
//!
//! Browsing surfaces, selector-driven parsers, event assembly and the
//! traversal loop that ties them together.

pub mod assemble;
pub mod bookmaker;
pub mod browser;
pub mod cascade;
pub mod classify;
pub mod http;
pub mod normalize;
pub mod observer;
pub mod pacing;
pub mod parsers;
pub mod selectors;
pub mod traversal;

pub use assemble::{EventAssembler, EventFragments, MarketFragment, OutcomeFragment};
pub use bookmaker::{run, BookmakerProfile, BookmakerScraper, ConfiguredScraper};
pub use browser::{BrowsingSurface, ChromeSurface, PageSnapshot};
pub use http::HttpSurface;
pub use observer::{DebugDumpObserver, ItemObserver, LoggingObserver};
pub use pacing::Pacer;
pub use selectors::{SelectorTable, Selectors, Target};
pub use traversal::{traverse, TraversalController};

use url::Url;

use normalize::title_case_slug;

/// Path segments that never name a meeting
const NON_MEETING_SEGMENTS: &[&str] = &["horse-racing", "harness-racing", "greyhound-racing", "race"];

/// Build a sport landing page URL
pub fn sport_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Resolve a (possibly relative) href against the page it was found on.
///
/// Only http(s) targets are kept; fragments are dropped so that in-page
/// anchors to the same event collapse into one candidate.
pub fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

fn path_segments(url: &str) -> Vec<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).map(str::to_string).collect())
        })
        .unwrap_or_default()
}

/// Competition from the second-to-last path segment:
/// `/soccer/england/premier-league/arsenal-v-chelsea` -> "Premier League"
pub fn competition_from_url(url: &str) -> Option<String> {
    let segments = path_segments(url);
    if segments.len() < 2 {
        return None;
    }
    Some(title_case_slug(&segments[segments.len() - 2])).filter(|c| !c.is_empty())
}

/// Meeting name from a race URL:
/// `/horse-racing/australia-nz/randwick/race-1` -> "Randwick"
pub fn meeting_from_url(url: &str) -> Option<String> {
    path_segments(url)
        .iter()
        .rev()
        .find(|segment| {
            let segment = segment.to_lowercase();
            !NON_MEETING_SEGMENTS.contains(&segment.as_str()) && !segment.starts_with("race-")
        })
        .map(|segment| title_case_slug(segment))
        .filter(|m| !m.is_empty())
}
