//! Pacing between consecutive page visits.

use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Enforces a minimum delay between visits, with optional random jitter
#[derive(Clone)]
pub struct Pacer {
    state: Arc<Mutex<PacerState>>,
}

struct PacerState {
    last_visit: Option<Instant>,
    min_delay: Duration,
    jitter: Duration,
}

impl Pacer {
    /// Create a pacer
    ///
    /// # Arguments
    /// * `min_delay` - Minimum time between the start of two visits
    /// * `jitter` - Upper bound of a random extra delay added on top
    pub fn new(min_delay: Duration, jitter: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(PacerState {
                last_visit: None,
                min_delay,
                jitter,
            })),
        }
    }

    /// Fixed delay, no jitter
    pub fn fixed(min_delay: Duration) -> Self {
        Self::new(min_delay, Duration::ZERO)
    }

    /// Pacer that never waits
    pub fn unpaced() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Time still to wait before the next visit may start
    pub async fn remaining(&self) -> Duration {
        let state = self.state.lock().await;
        match state.last_visit {
            Some(last) => state.min_delay.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Wait until the next visit is allowed and record it.
    ///
    /// The first call never waits.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        if let Some(last) = state.last_visit {
            let mut delay = state.min_delay.saturating_sub(last.elapsed());
            if !state.jitter.is_zero() {
                let extra = rand::thread_rng().gen_range(0.0..1.0);
                delay += state.jitter.mul_f64(extra);
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        state.last_visit = Some(Instant::now());
    }
}
