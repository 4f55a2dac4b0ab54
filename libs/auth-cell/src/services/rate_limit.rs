// =====================================================================================
// RATE LIMITER - FIXED-WINDOW COUNTERS OVER THE SHARED STORE
// =====================================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use crate::models::RateLimitCounter;
use shared_store::Store;

/// Fixed-window limiter. The call that pushes a counter over the limit is
/// itself recorded, so a window that has been exhausted keeps counting until
/// it rolls over. Store failures degrade open with a warning rather than
/// rejecting traffic.
#[derive(Clone)]
pub struct RateLimiter {
    store: Store,
}

impl RateLimiter {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    fn counter_key(key: &str) -> String {
        format!("rate:{}", key)
    }

    pub async fn is_rate_limited(&self, key: &str, max_attempts: u32, window: Duration) -> bool {
        self.is_rate_limited_at(key, max_attempts, window, Utc::now())
            .await
    }

    #[instrument(skip(self))]
    pub async fn is_rate_limited_at(
        &self,
        key: &str,
        max_attempts: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let store_key = Self::counter_key(key);

        let existing = match self.store.get_json::<RateLimitCounter>(&store_key).await {
            Ok(counter) => counter,
            Err(e) => {
                warn!(key, error = %e, "rate limit read failed, allowing request");
                return false;
            }
        };

        match existing {
            Some(mut counter) if now < counter.window_reset_at => {
                counter.count += 1;
                let limited = counter.count > max_attempts;
                if let Err(e) = self
                    .store
                    .set_json(&store_key, &counter, Some(window * 2))
                    .await
                {
                    warn!(key, error = %e, "rate limit write failed");
                }
                limited
            }
            _ => {
                // First hit, or the window rolled over: reset to count 1.
                let counter = RateLimitCounter {
                    count: 1,
                    window_reset_at: now + chrono::Duration::from_std(window).unwrap(),
                };
                if let Err(e) = self
                    .store
                    .set_json(&store_key, &counter, Some(window * 2))
                    .await
                {
                    warn!(key, error = %e, "rate limit write failed");
                }
                false
            }
        }
    }

    pub async fn reset_attempts(&self, key: &str) {
        if let Err(e) = self.store.delete(&Self::counter_key(key)).await {
            warn!(key, error = %e, "rate limit reset failed");
        }
    }

    pub async fn remaining_attempts(&self, key: &str, max_attempts: u32) -> u32 {
        match self
            .store
            .get_json::<RateLimitCounter>(&Self::counter_key(key))
            .await
        {
            Ok(Some(counter)) => max_attempts.saturating_sub(counter.count),
            Ok(None) => max_attempts,
            Err(e) => {
                warn!(key, error = %e, "rate limit read failed");
                max_attempts
            }
        }
    }
}
