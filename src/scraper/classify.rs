//! Market type classification.
//!
//! A pure function of (label, outcome count). Keyword rules are checked in
//! table order against the lower-cased label and the first hit wins. Only
//! when no keyword matches is the shape of the market used: two outcomes
//! read as a moneyline, three as a three-way result.

use crate::types::MarketType;

/// Ordered keyword rules
const KEYWORD_RULES: &[(&[&str], MarketType)] = &[
    (
        &["winner", "win", "head to head", "h2h", "match result"],
        MarketType::Win,
    ),
    (&["handicap", "line", "spread"], MarketType::Handicap),
    (&["over/under", "total", "o/u"], MarketType::TotalOverUnder),
    (&["correct score"], MarketType::CorrectScore),
    (&["player"], MarketType::PlayerProps),
    (&["place"], MarketType::Place),
    (&["each way", "e/w"], MarketType::EachWay),
    (&["quinella", "quin"], MarketType::Quinella),
    (&["exacta", "forecast"], MarketType::Exacta),
    (&["trifecta", "tricast"], MarketType::Trifecta),
];

/// Classify a market from its label and number of outcomes
pub fn classify(label: &str, outcome_count: usize) -> MarketType {
    classify_label(label).unwrap_or_else(|| classify_shape(outcome_count))
}

/// Keyword match only
pub fn classify_label(label: &str) -> Option<MarketType> {
    let label = label.to_lowercase();
    if label.trim().is_empty() {
        return None;
    }
    KEYWORD_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| label.contains(k)))
        .map(|(_, market_type)| *market_type)
}

/// Shape inference for markets whose label did not resolve
pub fn classify_shape(outcome_count: usize) -> MarketType {
    match outcome_count {
        2 => MarketType::Moneyline,
        3 => MarketType::Win,
        _ => MarketType::Other,
    }
}

/// Display name for a market whose label could not be read
pub fn default_market_name(market_type: MarketType) -> &'static str {
    match market_type {
        MarketType::Moneyline => "Head to Head",
        MarketType::Win => "Match Result",
        _ => "Unknown Market",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table() {
        let cases: &[(&str, usize, MarketType)] = &[
            ("Match Result", 3, MarketType::Win),
            ("Total Goals Over/Under", 2, MarketType::TotalOverUnder),
            ("", 2, MarketType::Moneyline),
            ("", 3, MarketType::Win),
            ("", 5, MarketType::Other),
            ("", 0, MarketType::Other),
            ("Head To Head", 2, MarketType::Win),
            ("Asian Handicap", 2, MarketType::Handicap),
            ("Points Spread", 2, MarketType::Handicap),
            ("Correct Score", 20, MarketType::CorrectScore),
            ("Player Disposals", 10, MarketType::PlayerProps),
            ("Place", 8, MarketType::Place),
            ("Each Way", 8, MarketType::EachWay),
            ("E/W Terms", 8, MarketType::EachWay),
            ("Quinella", 28, MarketType::Quinella),
            ("Forecast", 56, MarketType::Exacta),
            ("Tricast", 336, MarketType::Trifecta),
            ("First Goalscorer", 2, MarketType::Moneyline),
            ("First Goalscorer", 12, MarketType::Other),
        ];

        for (label, count, expected) in cases {
            assert_eq!(classify(label, *count), *expected, "label={:?} count={}", label, count);
        }
    }

    #[test]
    fn test_keyword_order_wins_over_shape() {
        // "win" appears before any shape rule even with two outcomes
        assert_eq!(classify("Win", 2), MarketType::Win);
        // "handicap" rule precedes "total"
        assert_eq!(classify("Handicap Total", 2), MarketType::Handicap);
    }

    #[test]
    fn test_whitespace_label_is_unresolved() {
        assert_eq!(classify_label("   "), None);
        assert_eq!(classify("   ", 2), MarketType::Moneyline);
    }

    #[test]
    fn test_default_market_name() {
        assert_eq!(default_market_name(classify("", 2)), "Head to Head");
        assert_eq!(default_market_name(classify("", 3)), "Match Result");
        assert_eq!(default_market_name(classify("", 7)), "Unknown Market");
    }
}
