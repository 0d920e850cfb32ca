//! Bounded traversal of listing pages.
//!
//! A listing yields candidate links that are visited one at a time, with
//! pacing between consecutive visits. One controller serves a whole run, so
//! `max_items` bounds the visits across every listing it is handed. An item
//! that fails is logged and skipped. Only run-level errors (the browsing
//! surface itself going away) stop the loop, and the events gathered so far
//! are still returned alongside the error.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::observer::{ItemObserver, ItemOutcome};
use super::pacing::Pacer;
use super::parsers::{CandidateRef, ListingParser, ListingTargets};
use super::selectors::Selectors;
use crate::error::ScrapeError;
use crate::types::Event;

/// Enumerate candidates from a listing page, capped at `max_items`
pub fn traverse(
    listing_html: &str,
    selectors: Selectors<'_>,
    targets: ListingTargets,
    base_url: &Url,
    max_items: usize,
) -> Vec<CandidateRef> {
    let mut candidates = ListingParser::parse(listing_html, selectors, targets, base_url);
    if candidates.len() > max_items {
        info!("Capping {} candidate(s) at {}", candidates.len(), max_items);
        candidates.truncate(max_items);
    }
    candidates
}

/// Result of visiting a batch of candidates
#[derive(Debug, Default)]
pub struct Traversal {
    pub events: Vec<Event>,
    pub visited: usize,
    pub failed: usize,
    pub cancelled: bool,
    /// Run-level error that stopped the traversal early
    pub aborted: Option<ScrapeError>,
}

/// Sequences per-item extraction
pub struct TraversalController {
    max_items: usize,
    /// Visits made so far, across all batches
    spent: AtomicUsize,
    pacer: Pacer,
    cancel: CancellationToken,
    observers: Vec<Arc<dyn ItemObserver>>,
}

impl TraversalController {
    pub fn new(max_items: usize, pacer: Pacer) -> Self {
        Self {
            max_items,
            spent: AtomicUsize::new(0),
            pacer,
            cancel: CancellationToken::new(),
            observers: Vec::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ItemObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Visits still allowed in this run
    pub fn remaining_items(&self) -> usize {
        self.max_items.saturating_sub(self.spent.load(Ordering::SeqCst))
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Visit candidates in order until the run's item budget is spent.
    /// Cancellation is honoured between items, never in the middle of one.
    pub async fn visit_all<F, Fut>(&self, candidates: Vec<CandidateRef>, mut visit: F) -> Traversal
    where
        F: FnMut(CandidateRef) -> Fut,
        Fut: Future<Output = Result<Event, ScrapeError>>,
    {
        let mut traversal = Traversal::default();

        for candidate in candidates {
            if self.cancel.is_cancelled() {
                traversal.cancelled = true;
                break;
            }
            if self.remaining_items() == 0 {
                info!("Item budget of {} spent", self.max_items);
                break;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    traversal.cancelled = true;
                    break;
                }
                _ = self.pacer.acquire() => {}
            }

            let url = candidate.url.clone();
            debug!("Visiting {}", url);
            self.spent.fetch_add(1, Ordering::SeqCst);
            traversal.visited += 1;

            match visit(candidate).await {
                Ok(event) => {
                    self.notify(&url, ItemOutcome::Extracted(&event));
                    traversal.events.push(event);
                }
                Err(e) if e.is_item_level() => {
                    self.notify(&url, ItemOutcome::Failed(&e));
                    traversal.failed += 1;
                }
                Err(e) => {
                    self.notify(&url, ItemOutcome::Failed(&e));
                    traversal.aborted = Some(e);
                    break;
                }
            }
        }

        if traversal.cancelled {
            warn!("Traversal cancelled after {} item(s)", traversal.visited);
        }
        info!(
            "Visited {} item(s): {} event(s), {} failure(s)",
            traversal.visited,
            traversal.events.len(),
            traversal.failed
        );
        traversal
    }

    fn notify(&self, url: &str, outcome: ItemOutcome<'_>) {
        if let ItemOutcome::Failed(e) = outcome {
            warn!("Item {} failed: {}", url, e);
        }
        for observer in &self.observers {
            observer.on_item(url, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::assemble::{EventAssembler, EventFragments, MarketFragment, OutcomeFragment};
    use crate::scraper::selectors::SelectorTable;
    use crate::types::{Bookmaker, SportType};
    use std::sync::Mutex;
    use tokio::time::{Duration, Instant};

    const LISTING_HTML: &str = r#"<html><body>
<div class="event-card"><a href="/soccer/epl/arsenal-v-chelsea-1">Arsenal v Chelsea</a></div>
<div class="event-card"><a href="/soccer/epl/spurs-v-leeds-2">Spurs v Leeds</a></div>
<div class="event-card"><a href="/soccer/epl/city-v-united-3">City v United</a></div>
</body></html>"#;

    fn event_for(url: &str) -> Event {
        let assembler = EventAssembler::new(Arc::new(Bookmaker::new("sportsbet", "Sportsbet", "https://x.test")));
        let fragments = EventFragments {
            name: Some("A v B".to_string()),
            markets: vec![MarketFragment {
                label: Some("Head to Head".to_string()),
                outcomes: vec![
                    OutcomeFragment::new(Some("A".into()), Some("1.90".into())),
                    OutcomeFragment::new(Some("B".into()), Some("1.90".into())),
                ],
                is_live: false,
            }],
            ..Default::default()
        };
        assembler.assemble(fragments, url, SportType::Soccer).unwrap()
    }

    fn candidates(n: usize) -> Vec<CandidateRef> {
        (0..n).map(|i| CandidateRef::new(format!("https://x.test/soccer/epl/e-{}", i))).collect()
    }

    #[derive(Default)]
    struct CountingObserver {
        seen: Mutex<Vec<(String, bool)>>,
    }

    impl ItemObserver for CountingObserver {
        fn on_item(&self, url: &str, outcome: ItemOutcome<'_>) {
            let ok = matches!(outcome, ItemOutcome::Extracted(_));
            self.seen.lock().unwrap().push((url.to_string(), ok));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_and_pacing() {
        let table = SelectorTable::builtin();
        let base = Url::parse("https://www.sportsbet.com.au").unwrap();
        let refs = traverse(LISTING_HTML, table.for_bookmaker("sportsbet"), ListingTargets::EVENTS, &base, 2);
        assert_eq!(refs.len(), 2);

        let controller = TraversalController::new(2, Pacer::fixed(Duration::from_secs(1)));
        let visits = Arc::new(Mutex::new(Vec::new()));

        let traversal = controller
            .visit_all(refs, |candidate| {
                let visits = visits.clone();
                async move {
                    visits.lock().unwrap().push(Instant::now());
                    Ok(event_for(&candidate.url))
                }
            })
            .await;

        let visits = visits.lock().unwrap();
        assert_eq!(visits.len(), 2);
        assert!(visits[1] - visits[0] >= Duration::from_secs(1));
        assert_eq!(traversal.events.len(), 2);
        assert_eq!(traversal.visited, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_spans_batches() {
        let controller = TraversalController::new(3, Pacer::unpaced());

        let first = controller
            .visit_all(candidates(2), |candidate| async move { Ok(event_for(&candidate.url)) })
            .await;
        assert_eq!(first.visited, 2);
        assert_eq!(controller.remaining_items(), 1);

        let second = controller
            .visit_all(candidates(2), |candidate| async move {
                Err(ScrapeError::EmptyResult { url: candidate.url })
            })
            .await;
        assert_eq!(second.visited, 1);
        assert_eq!(second.failed, 1);
        assert_eq!(controller.remaining_items(), 0);

        let third = controller
            .visit_all(candidates(2), |candidate| async move { Ok(event_for(&candidate.url)) })
            .await;
        assert_eq!(third.visited, 0);
        assert!(!third.cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_isolated() {
        let observer = Arc::new(CountingObserver::default());
        let controller = TraversalController::new(10, Pacer::fixed(Duration::from_millis(100)))
            .with_observer(observer.clone());

        let traversal = controller
            .visit_all(candidates(3), |candidate| async move {
                if candidate.url.ends_with("e-1") {
                    Err(ScrapeError::NavigationTimeout {
                        url: candidate.url,
                        timeout_ms: 30_000,
                    })
                } else {
                    Ok(event_for(&candidate.url))
                }
            })
            .await;

        assert_eq!(traversal.events.len(), 2);
        assert_eq!(traversal.failed, 1);
        assert!(traversal.aborted.is_none());

        let seen = observer.seen.lock().unwrap();
        let flags: Vec<bool> = seen.iter().map(|(_, ok)| *ok).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_level_error_stops_with_partial_events() {
        let controller = TraversalController::new(10, Pacer::unpaced());

        let traversal = controller
            .visit_all(candidates(4), |candidate| async move {
                if candidate.url.ends_with("e-2") {
                    Err(ScrapeError::Browser("connection closed".into()))
                } else {
                    Ok(event_for(&candidate.url))
                }
            })
            .await;

        assert_eq!(traversal.events.len(), 2);
        assert_eq!(traversal.visited, 3);
        assert!(matches!(traversal.aborted, Some(ScrapeError::Browser(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_between_items() {
        let controller = TraversalController::new(10, Pacer::fixed(Duration::from_secs(1)));
        let token = controller.cancellation_token();

        let traversal = controller
            .visit_all(candidates(5), |candidate| {
                let token = token.clone();
                async move {
                    // The item in progress still completes
                    if candidate.url.ends_with("e-1") {
                        token.cancel();
                    }
                    Ok(event_for(&candidate.url))
                }
            })
            .await;

        assert!(traversal.cancelled);
        assert_eq!(traversal.visited, 2);
        assert_eq!(traversal.events.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_pacing_wait() {
        let controller = TraversalController::new(10, Pacer::fixed(Duration::from_secs(3600)));
        let token = controller.cancellation_token();

        tokio::spawn({
            let token = token.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                token.cancel();
            }
        });

        let start = Instant::now();
        let traversal = controller
            .visit_all(candidates(3), |candidate| async move { Ok(event_for(&candidate.url)) })
            .await;

        assert!(traversal.cancelled);
        assert_eq!(traversal.visited, 1);
        assert!(start.elapsed() < Duration::from_secs(3600));
    }
}
