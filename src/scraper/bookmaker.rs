//! Bookmaker scrapers.
//!
//! Every bookmaker is described by data: a profile (identity, sport paths,
//! whether pages need script rendering) plus its entries in the selector
//! table. One [`ConfiguredScraper`] drives any profile through a browsing
//! surface.

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

use super::assemble::EventAssembler;
use super::browser::BrowsingSurface;
use super::parsers::{CandidateRef, EventPageParser, ListingTargets, RaceCardParser};
use super::selectors::SelectorTable;
use super::traversal::{traverse, TraversalController};
use super::{competition_from_url, meeting_from_url, sport_url};
use crate::error::{ScrapeError, SportFailure};
use crate::types::{Bookmaker, Event, ScrapingResult, SportType};

/// Static description of a bookmaker site
#[derive(Debug, Clone)]
pub struct BookmakerProfile {
    pub bookmaker: Arc<Bookmaker>,
    /// Landing page path per supported sport
    pub sport_paths: Vec<(SportType, String)>,
    /// Pages only render their markets through client-side scripts
    pub uses_browser: bool,
}

impl BookmakerProfile {
    pub fn sportsbet() -> Self {
        let sport_paths = [
            (SportType::Soccer, "/soccer"),
            (SportType::Basketball, "/basketball"),
            (SportType::Tennis, "/tennis"),
            (SportType::Cricket, "/cricket"),
            (SportType::Nrl, "/rugby-league"),
            (SportType::Rugby, "/rugby-union"),
            (SportType::Afl, "/australian-rules"),
            (SportType::HorseRacing, "/horse-racing"),
        ];

        Self {
            bookmaker: Arc::new(Bookmaker::new("sportsbet", "Sportsbet", "https://www.sportsbet.com.au")),
            sport_paths: sport_paths
                .iter()
                .map(|(sport, path)| (*sport, path.to_string()))
                .collect(),
            uses_browser: true,
        }
    }

    /// All built-in profiles
    pub fn builtin() -> Vec<Self> {
        vec![Self::sportsbet()]
    }

    /// Built-in profile by bookmaker id
    pub fn find(id: &str) -> Option<Self> {
        Self::builtin().into_iter().find(|p| p.bookmaker.id == id)
    }

    pub fn sport_path(&self, sport: SportType) -> Option<&str> {
        self.sport_paths
            .iter()
            .find(|(s, _)| *s == sport)
            .map(|(_, path)| path.as_str())
    }
}

/// Capabilities every bookmaker scraper offers
#[async_trait]
pub trait BookmakerScraper: Send + Sync {
    fn bookmaker(&self) -> &Arc<Bookmaker>;

    /// Supported sports and their landing page paths
    fn sport_paths(&self) -> &[(SportType, String)];

    fn uses_browser(&self) -> bool;

    /// Whether the run has been asked to stop
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Scrape the events listed for one sport.
    ///
    /// Item-level failures are absorbed; only run-level errors are returned,
    /// together with whatever the sport had extracted before them.
    async fn scrape_sport(&self, sport: SportType) -> Result<Vec<Event>, SportFailure>;

    /// Scrape a single event page, inferring the sport from its URL
    async fn scrape_event(&self, url: &str) -> Result<Event, ScrapeError>;
}

/// Data-driven scraper for any [`BookmakerProfile`]
pub struct ConfiguredScraper {
    profile: BookmakerProfile,
    selectors: Arc<SelectorTable>,
    surface: Arc<dyn BrowsingSurface>,
    assembler: EventAssembler,
    controller: TraversalController,
    navigation_timeout: Duration,
}

impl ConfiguredScraper {
    pub fn new(
        profile: BookmakerProfile,
        selectors: Arc<SelectorTable>,
        surface: Arc<dyn BrowsingSurface>,
        controller: TraversalController,
        navigation_timeout: Duration,
    ) -> Self {
        if !selectors.has_bookmaker(&profile.bookmaker.id) {
            warn!("No selectors configured for {}", profile.bookmaker.id);
        }
        let assembler = EventAssembler::new(profile.bookmaker.clone());
        Self {
            profile,
            selectors,
            surface,
            assembler,
            controller,
            navigation_timeout,
        }
    }

    pub fn profile(&self) -> &BookmakerProfile {
        &self.profile
    }

    /// Scrape a single event page as the given sport
    pub async fn scrape_event_as(&self, url: &str, sport: SportType) -> Result<Event, ScrapeError> {
        self.extract(CandidateRef::new(url), sport).await
    }

    /// Load, parse and assemble one candidate
    async fn extract(&self, candidate: CandidateRef, sport: SportType) -> Result<Event, ScrapeError> {
        let snapshot = self.surface.navigate(&candidate.url, self.navigation_timeout).await?;
        let selectors = self.selectors.for_bookmaker(&self.profile.bookmaker.id);
        let racing = sport == SportType::HorseRacing;

        let mut fragments = if racing {
            RaceCardParser::parse(&snapshot.html, selectors, &candidate.url)
        } else {
            EventPageParser::parse(&snapshot.html, selectors)
        };

        // Page, then listing, then URL
        if fragments.competition.is_none() {
            fragments.competition = candidate.competition.clone().or_else(|| {
                if racing {
                    meeting_from_url(&candidate.url)
                } else {
                    competition_from_url(&candidate.url)
                }
            });
        }

        self.assembler
            .assemble(fragments, &candidate.url, sport)
            .ok_or(ScrapeError::EmptyResult { url: candidate.url })
    }
}

#[async_trait]
impl BookmakerScraper for ConfiguredScraper {
    fn bookmaker(&self) -> &Arc<Bookmaker> {
        &self.profile.bookmaker
    }

    fn sport_paths(&self) -> &[(SportType, String)] {
        &self.profile.sport_paths
    }

    fn uses_browser(&self) -> bool {
        self.profile.uses_browser
    }

    fn is_cancelled(&self) -> bool {
        self.controller.is_cancelled()
    }

    async fn scrape_sport(&self, sport: SportType) -> Result<Vec<Event>, SportFailure> {
        let bookmaker = &self.profile.bookmaker;
        let Some(path) = self.profile.sport_path(sport) else {
            warn!("{} has no listing for {}", bookmaker.name, sport);
            return Ok(Vec::new());
        };
        if self.controller.is_cancelled() {
            return Err(ScrapeError::Cancelled.into());
        }
        if self.controller.remaining_items() == 0 {
            info!("Item budget spent, skipping {}", sport);
            return Ok(Vec::new());
        }

        let listing_url = sport_url(&bookmaker.base_url, path);
        info!("Scraping {} events from {}", sport, listing_url);

        let listing = match self.surface.navigate(&listing_url, self.navigation_timeout).await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_item_level() => {
                warn!("Listing {} unavailable: {}", listing_url, e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let base = Url::parse(&listing.url).map_err(|e| ScrapeError::Navigation {
            url: listing.url.clone(),
            reason: e.to_string(),
        })?;
        let targets = if sport == SportType::HorseRacing {
            ListingTargets::RACES
        } else {
            ListingTargets::EVENTS
        };
        let candidates = traverse(
            &listing.html,
            self.selectors.for_bookmaker(&bookmaker.id),
            targets,
            &base,
            self.controller.remaining_items(),
        );

        let traversal = self
            .controller
            .visit_all(candidates, |candidate| self.extract(candidate, sport))
            .await;

        let error = match traversal.aborted {
            Some(e) => e,
            None if traversal.cancelled => ScrapeError::Cancelled,
            None => return Ok(traversal.events),
        };
        Err(SportFailure {
            events: traversal.events,
            error,
        })
    }

    async fn scrape_event(&self, url: &str) -> Result<Event, ScrapeError> {
        self.scrape_event_as(url, SportType::from_url(url)).await
    }
}

/// Run one extraction pass over `sports`.
///
/// Never fails: a run-level error, a cancellation or a panic inside the
/// scraper is reported through the result's `success` flag with the events
/// gathered before it happened.
pub async fn run(scraper: &dyn BookmakerScraper, sports: &[SportType]) -> ScrapingResult {
    let bookmaker = scraper.bookmaker().clone();
    let mut events = Vec::new();

    for sport in sports {
        if scraper.is_cancelled() {
            warn!("{}: cancelled before {}", bookmaker.name, sport);
            return ScrapingResult::failed(bookmaker, events, ScrapeError::Cancelled);
        }

        let outcome = AssertUnwindSafe(scraper.scrape_sport(*sport))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(ScrapeError::RunFailure(format!("scraper panicked on {}", sport)).into()));

        match outcome {
            Ok(found) => {
                info!("{}: {} {} event(s)", bookmaker.name, found.len(), sport);
                events.extend(found);
            }
            Err(failure) => {
                error!("Error scraping {} {}: {}", bookmaker.name, sport, failure.error);
                if !failure.events.is_empty() {
                    info!("Keeping {} {} event(s) extracted before the failure", failure.events.len(), sport);
                }
                events.extend(failure.events);
                return ScrapingResult::failed(bookmaker, events, failure.error);
            }
        }
    }

    ScrapingResult::succeeded(bookmaker, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::browser::PageSnapshot;
    use crate::scraper::pacing::Pacer;
    use crate::types::MarketType;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BASE: &str = "https://www.sportsbet.com.au";

    const SOCCER_LISTING: &str = r#"<html><body>
<div class="competition-container">
    <h2 class="competition-name">English Premier League</h2>
    <a class="event-link" href="/soccer/england/premier-league/arsenal-v-chelsea-1">Arsenal v Chelsea</a>
    <a class="event-link" href="/soccer/england/premier-league/spurs-v-leeds-2">Spurs v Leeds</a>
    <a class="event-link" href="/soccer/england/premier-league/city-v-united-3">City v United</a>
</div>
</body></html>"#;

    const ARSENAL_PAGE: &str = r#"<html><head><title>Arsenal v Chelsea Betting Odds | Sportsbet</title></head><body>
<div data-automation-id="market-match-result">
    <h3>Match Result</h3>
    <button class="outcome-button"><span class="outcome-name">Arsenal</span><span class="price-text">$2.10</span></button>
    <button class="outcome-button"><span class="outcome-name">Draw</span><span class="price-text">$3.40</span></button>
    <button class="outcome-button"><span class="outcome-name">Chelsea</span><span class="price-text">$3.50</span></button>
</div>
</body></html>"#;

    const SUSPENDED_PAGE: &str = r#"<html><head><title>Spurs v Leeds</title></head><body>
<div data-automation-id="market-head-to-head">
    <h3>Head to Head</h3>
    <button class="outcome-button"><span class="outcome-name">Spurs</span><span class="price-text">$0.90</span></button>
</div>
</body></html>"#;

    const RACING_LISTING: &str = r#"<html><body>
<a href="/horse-racing/australia-nz/randwick/race-1">R1</a>
</body></html>"#;

    const RACE_PAGE: &str = r#"<html><head><title>Maiden Plate - Sportsbet</title></head><body>
<div class="runner-row"><span class="runner-number">1</span><span class="runner-name">Fast Horse</span>
    <span class="win-price">$4.20</span><span class="place-price">$1.70</span></div>
<div class="runner-row"><span class="runner-number">2</span><span class="runner-name">Slow Horse</span>
    <span class="win-price">$9.00</span><span class="place-price">$2.60</span></div>
</body></html>"#;

    /// Serves canned pages; unknown URLs fail navigation, `crash` URLs
    /// simulate the browser dying.
    #[derive(Default)]
    struct FakeSurface {
        pages: HashMap<String, String>,
        crash: Vec<String>,
        visited: Mutex<Vec<String>>,
    }

    impl FakeSurface {
        fn with_page(mut self, path: &str, html: &str) -> Self {
            self.pages.insert(format!("{}{}", BASE, path), html.to_string());
            self
        }

        fn crashing_on(mut self, path: &str) -> Self {
            self.crash.push(format!("{}{}", BASE, path));
            self
        }
    }

    #[async_trait]
    impl BrowsingSurface for FakeSurface {
        async fn navigate(&self, url: &str, _timeout: Duration) -> Result<PageSnapshot, ScrapeError> {
            self.visited.lock().unwrap().push(url.to_string());
            if self.crash.iter().any(|c| c == url) {
                return Err(ScrapeError::Browser("target closed".into()));
            }
            match self.pages.get(url) {
                Some(html) => Ok(PageSnapshot {
                    url: url.to_string(),
                    html: html.clone(),
                }),
                None => Err(ScrapeError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: 30_000,
                }),
            }
        }

        async fn close(&self) -> Result<(), ScrapeError> {
            Ok(())
        }
    }

    fn scraper(surface: Arc<FakeSurface>, max_items: usize) -> ConfiguredScraper {
        scraper_with(surface, TraversalController::new(max_items, Pacer::unpaced()))
    }

    fn scraper_with(surface: Arc<FakeSurface>, controller: TraversalController) -> ConfiguredScraper {
        ConfiguredScraper::new(
            BookmakerProfile::sportsbet(),
            Arc::new(SelectorTable::builtin()),
            surface,
            controller,
            Duration::from_secs(30),
        )
    }

    #[test]
    fn test_profile_lookup() {
        let profile = BookmakerProfile::find("sportsbet").unwrap();
        assert_eq!(profile.sport_path(SportType::Nrl), Some("/rugby-league"));
        assert_eq!(profile.sport_path(SportType::Esports), None);
        assert!(profile.uses_browser);
        assert!(BookmakerProfile::find("nobody").is_none());
    }

    #[tokio::test]
    async fn test_scrape_sport_isolates_failures() {
        let surface = Arc::new(
            FakeSurface::default()
                .with_page("/soccer", SOCCER_LISTING)
                .with_page("/soccer/england/premier-league/arsenal-v-chelsea-1", ARSENAL_PAGE)
                .with_page("/soccer/england/premier-league/spurs-v-leeds-2", SUSPENDED_PAGE),
        );
        let scraper = scraper(surface.clone(), 10);

        let events = scraper.scrape_sport(SportType::Soccer).await.unwrap();

        // Spurs page has only a sub-1.0 price, City page fails to load
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.id(), "sportsbet_arsenal-v-chelsea-1");
        assert_eq!(event.home_team(), "Arsenal");
        assert_eq!(event.competition(), "English Premier League");
        assert_eq!(event.markets()[0].market_type(), MarketType::Win);
        assert_eq!(surface.visited.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_scrape_sport_respects_cap() {
        let surface = Arc::new(
            FakeSurface::default()
                .with_page("/soccer", SOCCER_LISTING)
                .with_page("/soccer/england/premier-league/arsenal-v-chelsea-1", ARSENAL_PAGE),
        );
        let scraper = scraper(surface.clone(), 1);

        let events = scraper.scrape_sport(SportType::Soccer).await.unwrap();
        assert_eq!(events.len(), 1);
        // Listing plus a single item
        assert_eq!(surface.visited.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_scrape_racing() {
        let surface = Arc::new(
            FakeSurface::default()
                .with_page("/horse-racing", RACING_LISTING)
                .with_page("/horse-racing/australia-nz/randwick/race-1", RACE_PAGE),
        );
        let scraper = scraper(surface, 10);

        let events = scraper.scrape_sport(SportType::HorseRacing).await.unwrap();
        assert_eq!(events.len(), 1);

        let race = &events[0];
        assert_eq!(race.home_team(), "Race 1 - Maiden Plate");
        assert_eq!(race.away_team(), "");
        assert_eq!(race.competition(), "Randwick");
        let types: Vec<_> = race.markets().iter().map(|m| m.market_type()).collect();
        assert_eq!(types, vec![MarketType::Win, MarketType::Place, MarketType::EachWay]);
        assert_eq!(race.markets()[0].outcomes()[0].name(), "1. Fast Horse");
        assert!(race.market_by_type(MarketType::Place).is_some());
    }

    #[tokio::test]
    async fn test_missing_listing_is_not_a_failure() {
        let scraper = scraper(Arc::new(FakeSurface::default()), 10);
        assert!(scraper.scrape_sport(SportType::Soccer).await.unwrap().is_empty());
        // Unsupported sport
        assert!(scraper.scrape_sport(SportType::Esports).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scrape_event_infers_sport_and_competition() {
        let surface = Arc::new(
            FakeSurface::default().with_page("/soccer/england/premier-league/arsenal-v-chelsea-1", ARSENAL_PAGE),
        );
        let scraper = scraper(surface, 10);

        let event = scraper
            .scrape_event(&format!("{}/soccer/england/premier-league/arsenal-v-chelsea-1", BASE))
            .await
            .unwrap();
        assert_eq!(event.sport(), SportType::Soccer);
        assert_eq!(event.competition(), "Premier League");

        let err = scraper
            .scrape_event(&format!("{}/soccer/england/premier-league/spurs-v-leeds-2", BASE))
            .await
            .unwrap_err();
        assert!(err.is_item_level());
    }

    #[tokio::test]
    async fn test_run_reports_browser_failure() {
        let surface = Arc::new(
            FakeSurface::default()
                .with_page("/soccer", SOCCER_LISTING)
                .with_page("/soccer/england/premier-league/arsenal-v-chelsea-1", ARSENAL_PAGE)
                .crashing_on("/basketball"),
        );
        let scraper = scraper(surface, 10);

        let result = run(&scraper, &[SportType::Soccer, SportType::Basketball]).await;
        assert!(!result.success);
        assert_eq!(result.events.len(), 1);
        assert!(result.error_message.unwrap().contains("target closed"));
    }

    #[tokio::test]
    async fn test_run_keeps_events_extracted_before_abort() {
        let surface = Arc::new(
            FakeSurface::default()
                .with_page("/soccer", SOCCER_LISTING)
                .with_page("/soccer/england/premier-league/arsenal-v-chelsea-1", ARSENAL_PAGE)
                .crashing_on("/soccer/england/premier-league/spurs-v-leeds-2"),
        );
        let scraper = scraper(surface.clone(), 10);

        let failure = scraper.scrape_sport(SportType::Soccer).await.unwrap_err();
        assert_eq!(failure.events.len(), 1);
        assert!(matches!(failure.error, ScrapeError::Browser(_)));

        let result = run(&scraper, &[SportType::Soccer, SportType::Tennis]).await;
        assert!(!result.success);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].home_team(), "Arsenal");
        // City and the tennis listing are never reached
        let visited = surface.visited.lock().unwrap();
        assert!(!visited.iter().any(|u| u.ends_with("city-v-united-3") || u.ends_with("/tennis")));
    }

    #[tokio::test]
    async fn test_run_stops_when_cancelled() {
        let surface = Arc::new(FakeSurface::default().with_page("/soccer", SOCCER_LISTING));
        let controller = TraversalController::new(10, Pacer::unpaced());
        controller.cancellation_token().cancel();
        let scraper = scraper_with(surface.clone(), controller);

        let result = run(&scraper, &[SportType::Soccer, SportType::Tennis, SportType::Cricket]).await;
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("run cancelled"));
        assert!(result.events.is_empty());

        let failure = scraper.scrape_sport(SportType::Tennis).await.unwrap_err();
        assert!(matches!(failure.error, ScrapeError::Cancelled));
        assert!(surface.visited.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_item_budget_covers_whole_run() {
        let surface = Arc::new(
            FakeSurface::default()
                .with_page("/soccer", SOCCER_LISTING)
                .with_page("/soccer/england/premier-league/arsenal-v-chelsea-1", ARSENAL_PAGE)
                .with_page("/basketball", SOCCER_LISTING),
        );
        let scraper = scraper(surface.clone(), 1);

        let result = run(&scraper, &[SportType::Soccer, SportType::Basketball]).await;
        assert!(result.success);
        assert_eq!(result.events.len(), 1);
        // Soccer listing and one item; the basketball listing is skipped
        assert_eq!(surface.visited.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_with_zero_events_succeeds() {
        let scraper = scraper(Arc::new(FakeSurface::default()), 10);
        let result = run(&scraper, &[SportType::Tennis]).await;
        assert!(result.success);
        assert!(result.events.is_empty());
        assert_eq!(result.bookmaker.id, "sportsbet");
    }

    struct PanickingScraper {
        bookmaker: Arc<Bookmaker>,
    }

    #[async_trait]
    impl BookmakerScraper for PanickingScraper {
        fn bookmaker(&self) -> &Arc<Bookmaker> {
            &self.bookmaker
        }

        fn sport_paths(&self) -> &[(SportType, String)] {
            &[]
        }

        fn uses_browser(&self) -> bool {
            false
        }

        async fn scrape_sport(&self, _sport: SportType) -> Result<Vec<Event>, SportFailure> {
            panic!("unexpected markup");
        }

        async fn scrape_event(&self, url: &str) -> Result<Event, ScrapeError> {
            Err(ScrapeError::EmptyResult { url: url.to_string() })
        }
    }

    #[tokio::test]
    async fn test_run_survives_panicking_scraper() {
        let scraper = PanickingScraper {
            bookmaker: Arc::new(Bookmaker::new("broken", "Broken", "https://broken.test")),
        };
        let result = run(&scraper, &[SportType::Soccer]).await;
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("run failed: scraper panicked on SOCCER"));
    }
}
