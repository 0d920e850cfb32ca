//! Per-item observers.
//!
//! The traversal loop reports each visited item to any number of
//! observers. Debug artifacts are written by an observer instead of being
//! interleaved with extraction.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::types::Event;

/// What happened to one visited item
#[derive(Debug, Clone, Copy)]
pub enum ItemOutcome<'a> {
    Extracted(&'a Event),
    Failed(&'a ScrapeError),
}

/// Notified after every item the traversal visits
pub trait ItemObserver: Send + Sync {
    fn on_item(&self, url: &str, outcome: ItemOutcome<'_>);
}

/// Logs each extracted item
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl ItemObserver for LoggingObserver {
    fn on_item(&self, url: &str, outcome: ItemOutcome<'_>) {
        match outcome {
            ItemOutcome::Extracted(event) => info!(
                "Extracted {} ({} market(s)) from {}",
                event.id(),
                event.markets().len(),
                url
            ),
            // Failures are already warned about by the traversal loop
            ItemOutcome::Failed(e) => debug!("Skipped {}: {}", url, e),
        }
    }
}

/// Summary written for each extracted event
#[derive(Debug, Serialize)]
struct ItemSummary<'a> {
    id: &'a str,
    sport: &'a str,
    home_team: &'a str,
    away_team: &'a str,
    competition: &'a str,
    url: &'a str,
    market_count: usize,
}

/// Writes a JSON summary of each extracted event into a directory
#[derive(Debug, Clone)]
pub struct DebugDumpObserver {
    dir: PathBuf,
}

impl DebugDumpObserver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write(&self, event: &Event) -> Result<PathBuf, ScrapeError> {
        std::fs::create_dir_all(&self.dir)?;

        let summary = ItemSummary {
            id: event.id(),
            sport: event.sport().as_str(),
            home_team: event.home_team(),
            away_team: event.away_team(),
            competition: event.competition(),
            url: event.url(),
            market_count: event.markets().len(),
        };

        let path = self.dir.join(format!("{}.json", event.id()));
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
        Ok(path)
    }
}

impl ItemObserver for DebugDumpObserver {
    fn on_item(&self, _url: &str, outcome: ItemOutcome<'_>) {
        if let ItemOutcome::Extracted(event) = outcome {
            if let Err(e) = self.write(event) {
                warn!("Failed to write debug dump for {}: {}", event.id(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::assemble::{EventAssembler, EventFragments, MarketFragment, OutcomeFragment};
    use crate::types::{Bookmaker, SportType};
    use std::sync::Arc;

    fn event() -> Event {
        let assembler = EventAssembler::new(Arc::new(Bookmaker::new("sportsbet", "Sportsbet", "https://x.test")));
        let fragments = EventFragments {
            name: Some("Storm v Broncos".to_string()),
            markets: vec![MarketFragment {
                label: Some("Head to Head".to_string()),
                outcomes: vec![
                    OutcomeFragment::new(Some("Storm".into()), Some("1.65".into())),
                    OutcomeFragment::new(Some("Broncos".into()), Some("2.25".into())),
                ],
                is_live: false,
            }],
            ..Default::default()
        };
        assembler
            .assemble(fragments, "https://x.test/rugby-league/nrl/storm-v-broncos", SportType::Nrl)
            .unwrap()
    }

    #[test]
    fn test_debug_dump_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let observer = DebugDumpObserver::new(dir.path().join("debug"));
        let event = event();

        observer.on_item(event.url(), ItemOutcome::Extracted(&event));

        let content = std::fs::read_to_string(dir.path().join("debug").join("sportsbet_storm-v-broncos.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["home_team"], "Storm");
        assert_eq!(value["sport"], "NRL");
        assert_eq!(value["market_count"], 1);
    }

    #[test]
    fn test_debug_dump_ignores_failures() {
        let dir = tempfile::tempdir().unwrap();
        let observer = DebugDumpObserver::new(dir.path());
        let error = ScrapeError::EmptyResult { url: "u".into() };

        observer.on_item("u", ItemOutcome::Failed(&error));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
