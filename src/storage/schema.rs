//! JSON artifact schema.
//!
//! Layout of one run artifact:
//! - bookmaker: {id, name, base_url}
//! - events[]: {id, sport, home_team, away_team, competition, start_time, url, markets[]}
//! - markets[]: {id, name, type, outcomes[]}
//! - outcomes[]: {name, odds}
//!
//! plus run metadata (timestamp, success, error_message).

use serde::{Deserialize, Serialize};

use crate::types::{Bookmaker, Event, Market, Outcome, ScrapingResult};

/// One run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub bookmaker: BookmakerRecord,
    pub events: Vec<EventRecord>,
    /// RFC 3339
    pub timestamp: String,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerRecord {
    pub id: String,
    pub name: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub competition: String,
    /// RFC 3339
    pub start_time: String,
    /// False when `start_time` is the extraction time
    #[serde(default)]
    pub start_time_resolved: bool,
    pub url: String,
    pub markets: Vec<MarketRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub market_type: String,
    #[serde(default)]
    pub is_live: bool,
    pub outcomes: Vec<OutcomeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub name: String,
    pub odds: f64,
}

impl From<&Bookmaker> for BookmakerRecord {
    fn from(bookmaker: &Bookmaker) -> Self {
        Self {
            id: bookmaker.id.clone(),
            name: bookmaker.name.clone(),
            base_url: bookmaker.base_url.clone(),
        }
    }
}

impl From<&Outcome> for OutcomeRecord {
    fn from(outcome: &Outcome) -> Self {
        Self {
            name: outcome.name().to_string(),
            odds: outcome.odds(),
        }
    }
}

impl From<&Market> for MarketRecord {
    fn from(market: &Market) -> Self {
        Self {
            id: market.id().to_string(),
            name: market.name().to_string(),
            market_type: market.market_type().as_str().to_string(),
            is_live: market.is_live(),
            outcomes: market.outcomes().iter().map(OutcomeRecord::from).collect(),
        }
    }
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id().to_string(),
            sport: event.sport().as_str().to_string(),
            home_team: event.home_team().to_string(),
            away_team: event.away_team().to_string(),
            competition: event.competition().to_string(),
            start_time: event.start_time().to_rfc3339(),
            start_time_resolved: event.start_time_resolved(),
            url: event.url().to_string(),
            markets: event.markets().iter().map(MarketRecord::from).collect(),
        }
    }
}

impl From<&ScrapingResult> for ResultRecord {
    fn from(result: &ScrapingResult) -> Self {
        Self {
            bookmaker: BookmakerRecord::from(result.bookmaker.as_ref()),
            events: result.events.iter().map(EventRecord::from).collect(),
            timestamp: result.timestamp.to_rfc3339(),
            success: result.success,
            error_message: result.error_message.clone(),
        }
    }
}
