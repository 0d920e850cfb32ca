//! Run artifacts written as JSON files.

use std::path::{Path, PathBuf};
use tracing::info;

use super::schema::ResultRecord;
use crate::error::ScrapeError;
use crate::types::ScrapingResult;

/// Writes one timestamped JSON file per run
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Artifact file name: `<bookmaker>_<label>_<YYYYMMDD_HHMMSS>.json`
    pub fn file_name(result: &ScrapingResult, label: &str) -> String {
        format!(
            "{}_{}_{}.json",
            result.bookmaker.id,
            label.to_lowercase(),
            result.timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    /// Serialize a run and return the path written
    pub fn save(&self, result: &ScrapingResult, label: &str) -> Result<PathBuf, ScrapeError> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(Self::file_name(result, label));
        let record = ResultRecord::from(result);
        std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;

        info!("Saved {} event(s) to {}", record.events.len(), path.display());
        Ok(path)
    }

    /// Read an artifact back
    pub fn load(path: impl AsRef<Path>) -> Result<ResultRecord, ScrapeError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::assemble::{EventAssembler, EventFragments, MarketFragment, OutcomeFragment};
    use crate::types::{Bookmaker, SportType};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn result() -> ScrapingResult {
        let bookmaker = Arc::new(Bookmaker::new("sportsbet", "Sportsbet", "https://www.sportsbet.com.au"));
        let assembler = EventAssembler::new(bookmaker.clone());
        let fragments = EventFragments {
            name: Some("Arsenal v Chelsea".to_string()),
            competition: Some("Premier League".to_string()),
            start_time: Some("2025-03-01T20:00:00Z".to_string()),
            markets: vec![MarketFragment {
                label: Some("Match Result".to_string()),
                outcomes: vec![
                    OutcomeFragment::new(Some("Arsenal".into()), Some("$2.10".into())),
                    OutcomeFragment::new(Some("Draw".into()), Some("$3.40".into())),
                    OutcomeFragment::new(Some("Chelsea".into()), Some("$3.50".into())),
                ],
                is_live: false,
            }],
        };
        let event = assembler
            .assemble(
                fragments,
                "https://www.sportsbet.com.au/soccer/england/premier-league/arsenal-v-chelsea-1",
                SportType::Soccer,
            )
            .unwrap();

        let mut result = ScrapingResult::succeeded(bookmaker, vec![event]);
        result.timestamp = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 5).unwrap();
        result
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            JsonStore::file_name(&result(), "SOCCER"),
            "sportsbet_soccer_20250301_093005.json"
        );
    }

    #[test]
    fn test_save_writes_stable_schema() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("output"));

        let path = store.save(&result(), "SOCCER").unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(value["bookmaker"]["id"], "sportsbet");
        assert_eq!(value["bookmaker"]["base_url"], "https://www.sportsbet.com.au");
        assert_eq!(value["success"], true);

        let event = &value["events"][0];
        assert_eq!(event["id"], "sportsbet_arsenal-v-chelsea-1");
        assert_eq!(event["sport"], "SOCCER");
        assert_eq!(event["away_team"], "Chelsea");
        assert_eq!(event["start_time"], "2025-03-01T20:00:00+00:00");

        let market = &event["markets"][0];
        assert_eq!(market["type"], "WIN");
        assert_eq!(market["name"], "Match Result");
        assert_eq!(market["outcomes"][2]["name"], "Chelsea");
        assert_eq!(market["outcomes"][2]["odds"], 3.5);
    }

    #[test]
    fn test_load_reads_saved_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let mut failed = result();
        failed.success = false;
        failed.error_message = Some("browser error: target closed".to_string());

        let path = store.save(&failed, "soccer").unwrap();
        let record = JsonStore::load(&path).unwrap();
        assert!(!record.success);
        assert_eq!(record.error_message.as_deref(), Some("browser error: target closed"));
        assert_eq!(record.events[0].markets[0].outcomes.len(), 3);
        assert!(record.events[0].start_time_resolved);
    }
}
