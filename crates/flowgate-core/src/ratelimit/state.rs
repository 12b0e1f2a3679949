//! In-memory fixed-window counter store and its background sweep.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::record::{RateLimitRecord, RateLimitStatus};

/// Process-local fixed-window rate limiter keyed by client id.
///
/// Constructed once by the server composition root and shared across handler
/// tasks; the record map sits behind a `Mutex` that is never held across an
/// await, so check-then-increment stays atomic with respect to other tasks.
/// State is not persisted and not shared across processes.
///
/// Known behavior of the fixed-window scheme: a client can burst up to twice
/// the nominal limit around a window boundary (end of one window plus start
/// of the next). This is accepted, not a bug.
#[derive(Debug, Default)]
pub struct RateLimiter {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and count one request from `client_id` against `limit` requests
    /// per `window`.
    pub fn check(&self, client_id: &str, limit: u32, window: Duration) -> RateLimitStatus {
        self.check_at(client_id, limit, window, Instant::now())
    }

    fn check_at(
        &self,
        client_id: &str,
        limit: u32,
        window: Duration,
        now: Instant,
    ) -> RateLimitStatus {
        let mut records = self.lock();

        match records.get_mut(client_id) {
            // No record, or the stored window has ended: start a fresh one.
            None => {
                let record = RateLimitRecord::fresh(now, window);
                let reset_at = record.reset_at;
                records.insert(client_id.to_string(), record);
                RateLimitStatus {
                    allowed: true,
                    limit,
                    remaining: limit.saturating_sub(1),
                    reset_at,
                }
            }
            Some(record) if record.expired(now) => {
                *record = RateLimitRecord::fresh(now, window);
                RateLimitStatus {
                    allowed: true,
                    limit,
                    remaining: limit.saturating_sub(1),
                    reset_at: record.reset_at,
                }
            }
            // Over the limit: reject without touching the window.
            Some(record) if record.count >= limit => RateLimitStatus {
                allowed: false,
                limit,
                remaining: 0,
                reset_at: record.reset_at,
            },
            Some(record) => {
                record.count += 1;
                RateLimitStatus {
                    allowed: true,
                    limit,
                    remaining: limit.saturating_sub(record.count),
                    reset_at: record.reset_at,
                }
            }
        }
    }

    /// Drop every record whose window has already ended. Returns how many
    /// records were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, record| !record.expired(now));
        before - records.len()
    }

    /// Number of live records (expired ones included until swept).
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Spawn the periodic expiry sweep, bounding memory growth from one-off
    /// client keys. Independent of request traffic; the returned handle can
    /// be aborted at shutdown.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "rate limit sweep removed expired records");
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RateLimitRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
