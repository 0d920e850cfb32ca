//! Data model for extracted betting markets.
//!
//! Every value here is created once during an extraction pass and never
//! mutated afterwards. Constructors enforce the invariants: an `Outcome`
//! always carries decimal odds above 1.0, a `Market` always has at least one
//! outcome and an `Event` always has at least one market.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ModelError;

/// Sport categories a bookmaker page can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SportType {
    Soccer,
    Basketball,
    Tennis,
    Rugby,
    Afl,
    Nrl,
    Cricket,
    HorseRacing,
    Esports,
    Other,
}

impl SportType {
    pub const ALL: [SportType; 10] = [
        SportType::Soccer,
        SportType::Basketball,
        SportType::Tennis,
        SportType::Rugby,
        SportType::Afl,
        SportType::Nrl,
        SportType::Cricket,
        SportType::HorseRacing,
        SportType::Esports,
        SportType::Other,
    ];

    /// Upper-case tag used in the JSON artifact
    pub fn as_str(&self) -> &'static str {
        match self {
            SportType::Soccer => "SOCCER",
            SportType::Basketball => "BASKETBALL",
            SportType::Tennis => "TENNIS",
            SportType::Rugby => "RUGBY",
            SportType::Afl => "AFL",
            SportType::Nrl => "NRL",
            SportType::Cricket => "CRICKET",
            SportType::HorseRacing => "HORSE_RACING",
            SportType::Esports => "ESPORTS",
            SportType::Other => "OTHER",
        }
    }

    /// Infer the sport from keywords in an event URL.
    ///
    /// Order matters: `rugby-league` must be checked before `rugby`, and the
    /// racing codes before everything else since race URLs often embed
    /// generic words.
    pub fn from_url(url: &str) -> Self {
        let url = url.to_lowercase();
        let rules: [(&[&str], SportType); 10] = [
            (&["horse-racing", "harness-racing"], SportType::HorseRacing),
            (&["greyhound"], SportType::Other),
            (&["basketball"], SportType::Basketball),
            (&["tennis"], SportType::Tennis),
            (&["cricket"], SportType::Cricket),
            (&["rugby-league"], SportType::Nrl),
            (&["rugby"], SportType::Rugby),
            (&["australian-rules", "afl"], SportType::Afl),
            (&["esports"], SportType::Esports),
            (&["soccer"], SportType::Soccer),
        ];

        rules
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| url.contains(k)))
            .map(|(_, sport)| *sport)
            .unwrap_or(SportType::Other)
    }
}

impl fmt::Display for SportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SportType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        SportType::ALL
            .iter()
            .find(|sport| sport.as_str() == normalized)
            .copied()
            .ok_or_else(|| ModelError::UnknownSport(s.to_string()))
    }
}

/// Closed set of market categories.
///
/// Racing-specific tags (place, each way, exotics) live in the same
/// enumeration as the sports tags so a single classifier covers every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketType {
    Win,
    Handicap,
    TotalOverUnder,
    Moneyline,
    CorrectScore,
    PlayerProps,
    Place,
    EachWay,
    Quinella,
    Exacta,
    Trifecta,
    Other,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Win => "WIN",
            MarketType::Handicap => "HANDICAP",
            MarketType::TotalOverUnder => "TOTAL_OVER_UNDER",
            MarketType::Moneyline => "MONEYLINE",
            MarketType::CorrectScore => "CORRECT_SCORE",
            MarketType::PlayerProps => "PLAYER_PROPS",
            MarketType::Place => "PLACE",
            MarketType::EachWay => "EACH_WAY",
            MarketType::Quinella => "QUINELLA",
            MarketType::Exacta => "EXACTA",
            MarketType::Trifecta => "TRIFECTA",
            MarketType::Other => "OTHER",
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookmaker metadata, shared read-only by every event it emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmaker {
    pub id: String,
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Commission rate as a fraction (0.05 = 5%)
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub min_stake: f64,
    /// None when the bookmaker does not cap stakes
    #[serde(default)]
    pub max_stake: Option<f64>,
}

impl Bookmaker {
    pub fn new(id: &str, name: &str, base_url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            logo_url: None,
            commission: 0.0,
            min_stake: 0.0,
            max_stake: None,
        }
    }
}

/// A single selection with validated decimal odds
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    name: String,
    odds: f64,
}

impl Outcome {
    /// Build an outcome, rejecting odds that are not a valid wagering price.
    pub fn new(name: impl Into<String>, odds: f64) -> Result<Self, ModelError> {
        if !odds.is_finite() || odds <= 1.0 {
            return Err(ModelError::InvalidOdds(odds));
        }
        Ok(Self {
            name: name.into(),
            odds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn odds(&self) -> f64 {
        self.odds
    }
}

/// A betting market with its outcomes in display order
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    id: String,
    market_type: MarketType,
    name: String,
    outcomes: Vec<Outcome>,
    is_live: bool,
}

impl Market {
    /// Returns `None` when `outcomes` is empty.
    pub fn new(
        id: impl Into<String>,
        market_type: MarketType,
        name: impl Into<String>,
        outcomes: Vec<Outcome>,
        is_live: bool,
    ) -> Option<Self> {
        if outcomes.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            market_type,
            name: name.into(),
            outcomes,
            is_live,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn market_type(&self) -> MarketType {
        self.market_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn is_live(&self) -> bool {
        self.is_live
    }
}

/// Everything needed to build an [`Event`] apart from its markets
#[derive(Debug, Clone)]
pub struct EventHeader {
    pub id: String,
    pub sport: SportType,
    pub home_team: String,
    pub away_team: String,
    pub competition: String,
    pub start_time: DateTime<Utc>,
    pub start_time_resolved: bool,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// A sporting event or race with at least one market
#[derive(Debug, Clone)]
pub struct Event {
    header: EventHeader,
    markets: Vec<Market>,
    bookmaker: Arc<Bookmaker>,
}

impl Event {
    /// Returns `None` when `markets` is empty.
    pub fn new(header: EventHeader, markets: Vec<Market>, bookmaker: Arc<Bookmaker>) -> Option<Self> {
        if markets.is_empty() {
            return None;
        }
        Some(Self {
            header,
            markets,
            bookmaker,
        })
    }

    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn sport(&self) -> SportType {
        self.header.sport
    }

    pub fn home_team(&self) -> &str {
        &self.header.home_team
    }

    /// Empty for single-participant events such as races
    pub fn away_team(&self) -> &str {
        &self.header.away_team
    }

    pub fn competition(&self) -> &str {
        &self.header.competition
    }

    /// Best-effort start time; see [`Event::start_time_resolved`].
    pub fn start_time(&self) -> DateTime<Utc> {
        self.header.start_time
    }

    /// False when the page gave no usable start time and extraction time
    /// was stamped instead.
    pub fn start_time_resolved(&self) -> bool {
        self.header.start_time_resolved
    }

    pub fn url(&self) -> &str {
        &self.header.url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.header.created_at
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn bookmaker(&self) -> &Arc<Bookmaker> {
        &self.bookmaker
    }

    /// First market of the given type, in display order
    pub fn market_by_type(&self, market_type: MarketType) -> Option<&Market> {
        self.markets.iter().find(|m| m.market_type == market_type)
    }
}

/// Output of one complete extraction run
#[derive(Debug, Clone)]
pub struct ScrapingResult {
    pub bookmaker: Arc<Bookmaker>,
    pub events: Vec<Event>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl ScrapingResult {
    pub fn succeeded(bookmaker: Arc<Bookmaker>, events: Vec<Event>) -> Self {
        Self {
            bookmaker,
            events,
            timestamp: Utc::now(),
            success: true,
            error_message: None,
        }
    }

    pub fn failed(bookmaker: Arc<Bookmaker>, events: Vec<Event>, error: impl fmt::Display) -> Self {
        Self {
            bookmaker,
            events,
            timestamp: Utc::now(),
            success: false,
            error_message: Some(error.to_string()),
        }
    }
}

/// One leg of an arbitrage opportunity
#[derive(Debug, Clone)]
pub struct ArbitrageSelection {
    pub name: String,
    pub odds: f64,
    pub bookmaker: Arc<Bookmaker>,
}

/// Cross-bookmaker arbitrage opportunity.
///
/// Only the shape lives here; detection and stake solving belong to a
/// downstream consumer of [`ScrapingResult`]s.
#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    pub event_description: String,
    pub market_description: String,
    pub selections: Vec<ArbitrageSelection>,
    /// Profit in percent (2.5 = 2.5%)
    pub profit_percentage: f64,
    pub required_investment: f64,
    pub stakes: HashMap<String, f64>,
    pub detection_time: DateTime<Utc>,
}

impl ArbitrageOpportunity {
    /// Build an opportunity, checking that a positive profit is backed by
    /// stakes that return at least the total investment on every selection.
    pub fn new(
        event_description: impl Into<String>,
        market_description: impl Into<String>,
        selections: Vec<ArbitrageSelection>,
        profit_percentage: f64,
        required_investment: f64,
        stakes: HashMap<String, f64>,
    ) -> Result<Self, ModelError> {
        if profit_percentage > 0.0 {
            for selection in &selections {
                let stake = stakes.get(&selection.name).copied().unwrap_or(0.0);
                let payout = stake * selection.odds;
                if payout < required_investment {
                    return Err(ModelError::NegativeReturn {
                        selection: selection.name.clone(),
                        payout,
                        investment: required_investment,
                    });
                }
            }
        }

        Ok(Self {
            event_description: event_description.into(),
            market_description: market_description.into(),
            selections,
            profit_percentage,
            required_investment,
            stakes,
            detection_time: Utc::now(),
        })
    }

    pub fn is_profitable(&self) -> bool {
        self.profit_percentage > 0.0
    }

    /// Stake for a selection, 0.0 when the selection is not staked
    pub fn stake_for(&self, selection_name: &str) -> f64 {
        self.stakes.get(selection_name).copied().unwrap_or(0.0)
    }

    pub fn expected_return(&self) -> f64 {
        self.required_investment * (1.0 + self.profit_percentage / 100.0)
    }
}
