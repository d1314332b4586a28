use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

use crate::error::ConfigurationError;
use crate::metrics::TRACKED_CLIENTS;

// Arrival times of admitted requests for one client key, oldest first
#[derive(Debug, Default)]
pub struct ClientWindow {
    pub timestamps: VecDeque<Instant>,
}

impl ClientWindow {
    // Drop every timestamp at or before `now - window`
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted { remaining: u32 },
    Rejected { retry_after_ms: u64 },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted { .. })
    }
}

/// Sliding-window limiter keyed by client identity.
///
/// The window moves with `now`, so a burst straddling a minute boundary is
/// still counted against the same quota. Only admitted requests are recorded.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    clients: DashMap<String, ClientWindow>,
}

impl RateLimiter {
    pub fn configure(limit: u32, window_ms: u64) -> Result<Self, ConfigurationError> {
        if limit == 0 {
            return Err(ConfigurationError::ZeroLimit);
        }
        if window_ms == 0 {
            return Err(ConfigurationError::ZeroWindow);
        }
        Ok(Self {
            limit,
            window: Duration::from_millis(window_ms),
            clients: DashMap::new(),
        })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window_ms(&self) -> u64 {
        self.window.as_millis() as u64
    }

    pub fn check(&self, key: &str, now: Instant) -> Decision {
        // The entry guard holds the shard lock until it is dropped, which makes
        // prune + compare + append atomic for this key.
        let mut entry = self.clients.entry(key.to_string()).or_default();
        entry.prune(now, self.window);

        let count = entry.timestamps.len() as u32;
        if count < self.limit {
            entry.timestamps.push_back(now);
            return Decision::Admitted {
                remaining: self.limit - (count + 1),
            };
        }

        // Full window, so there is an oldest entry and it is younger than `window`
        let retry_after = entry
            .timestamps
            .front()
            .map(|&oldest| self.window.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or(self.window);
        let retry_after_ms = (retry_after.as_nanos().div_ceil(1_000_000) as u64).max(1);

        Decision::Rejected { retry_after_ms }
    }

    // Evict keys whose window holds no live timestamps, returns how many were removed
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients.retain(|_, client| {
            client.prune(now, self.window);
            !client.timestamps.is_empty()
        });
        before.saturating_sub(self.clients.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.clients.len()
    }
}

// Background eviction of idle client windows
pub async fn sweeper(limiter: Arc<RateLimiter>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    tracing::info!(interval = ?sweep_interval, "rate limit sweeper started");

    loop {
        interval.tick().await;

        let evicted = limiter.sweep(Instant::now());
        let tracked = limiter.tracked_keys();
        TRACKED_CLIENTS.set(tracked as f64);

        if evicted > 0 {
            tracing::debug!(evicted, tracked, "evicted idle client windows");
        }
    }
}
