//! Text normalization for captured page fragments.
//!
//! Prices are only ever accepted as decimal odds. Anything that cannot be
//! read confidently as a decimal above 1.0 (fractional "5/2", American
//! "+150", "SUSP", "1.00") is rejected and logged, never coerced.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::ScrapeError;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '¢'];

/// Parse a decimal price, returning `None` for anything that is not a
/// valid wagering price.
pub fn parse_price(raw: &str) -> Option<f64> {
    match try_parse_price(raw) {
        Ok(price) => Some(price),
        Err(e) => {
            debug!("Dropping price: {}", e);
            None
        }
    }
}

/// Like [`parse_price`] but reports why a value was rejected
pub fn try_parse_price(raw: &str) -> Result<f64, ScrapeError> {
    let invalid = |reason| ScrapeError::InvalidValue {
        raw: raw.to_string(),
        reason,
    };

    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    if cleaned.is_empty() {
        return Err(invalid("empty price"));
    }
    if cleaned.contains('/') {
        return Err(invalid("fractional odds are not accepted"));
    }
    if cleaned.starts_with('+') {
        return Err(invalid("american odds are not accepted"));
    }

    let value: f64 = cleaned.parse().map_err(|_| invalid("not a decimal number"))?;
    if !value.is_finite() {
        return Err(invalid("not a finite number"));
    }
    if value <= 1.0 {
        return Err(invalid("decimal odds must be above 1.0"));
    }
    Ok(value)
}

/// Collapse runs of whitespace and trim
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a team name for matching across bookmakers
pub fn normalize_team_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .filter(|word| *word != "fc")
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip site boilerplate from a document title
///
/// "Arsenal v Chelsea Betting Odds | Sportsbet" -> "Arsenal v Chelsea".
/// A trailing " - <site>" segment is only dropped when it names `site`, so
/// "Storm - Broncos" survives.
pub fn clean_event_title(title: &str, site: &str) -> String {
    let mut name = title;
    if let Some(idx) = name.find(" Betting Odds") {
        name = &name[..idx];
    }
    if let Some(idx) = name.find(" | ") {
        name = &name[..idx];
    }
    if let Some((head, tail)) = name.trim_end().rsplit_once(" - ") {
        if names_site(tail, site) {
            name = head;
        }
    }
    clean_text(name)
}

/// "Sportsbet" and "Sportsbet.com.au" both name the site `sportsbet`
fn names_site(segment: &str, site: &str) -> bool {
    let squash = |s: &str| {
        s.chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    let site = squash(site);
    !site.is_empty() && squash(segment).starts_with(&site)
}

/// Title-case a URL slug: "royal-randwick" -> "Royal Randwick"
pub fn title_case_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-case, underscore-separated identifier fragment
pub fn slugify(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    slug.split_whitespace().collect::<Vec<_>>().join("_")
}

/// First integer appearing in a string ("No. 7" -> 7)
pub fn leading_number(text: &str) -> Option<u32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\d+").expect("static regex"));
    re.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Race number from a title such as "Race 4 Randwick"
pub fn race_number(text: &str) -> Option<u32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)\brace\s*(\d+)").expect("static regex"));
    re.captures(text).and_then(|caps| caps[1].parse().ok())
}

/// Parse a start time fragment.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (UTC) and a bare `HH:MM`,
/// which is taken as today (UTC) relative to `now`.
pub fn parse_start_time(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = clean_text(raw);
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&text, format) {
            return Some(naive.and_utc());
        }
    }

    static CLOCK: OnceLock<Regex> = OnceLock::new();
    let clock = CLOCK.get_or_init(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").expect("static regex"));
    let caps = clock.captures(&text)?;
    let time = NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, 0)?;
    let today: NaiveDate = now.date_naive();
    Some(today.and_time(time).and_utc())
}
