//! Per-provider request budgets.
//!
//! Fixed-window counters, two windows per provider: requests per minute and
//! requests per day. Consulted by the upstream client before every attempt;
//! an exhausted budget is reported as a transient failure so the caller's
//! stale-fallback path absorbs it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub per_minute: u32,
    pub per_day: u32,
}

impl Default for RateLimitConfig {
    /// One consistent policy for every provider: 10 requests a minute and
    /// 100 a day, matching the free tiers the service is pointed at.
    fn default() -> Self {
        RateLimitConfig {
            per_minute: 10,
            per_day: 100,
        }
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    fn new(now: Instant) -> Self {
        Window { started: now, count: 0 }
    }

    /// Take one slot, or return how long until the window rolls over.
    fn acquire(&mut self, limit: u32, length: Duration, now: Instant) -> Result<(), Duration> {
        if now.saturating_duration_since(self.started) >= length {
            self.started = now;
            self.count = 0;
        }
        if self.count >= limit {
            let elapsed = now.saturating_duration_since(self.started);
            return Err(length.saturating_sub(elapsed));
        }
        self.count += 1;
        Ok(())
    }
}

#[derive(Debug)]
struct ProviderBudget {
    minute: Window,
    day: Window,
}

/// Shared fixed-window rate limiter. Clones share the same counters.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    budgets: Arc<Mutex<HashMap<String, ProviderBudget>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        RateLimiter {
            config,
            budgets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reserve one request slot for `provider`, or return the time until the
    /// earliest window with free capacity.
    pub fn try_acquire(&self, provider: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let mut budgets = self.budgets.lock().unwrap_or_else(|e| e.into_inner());
        let budget = budgets
            .entry(provider.to_string())
            .or_insert_with(|| ProviderBudget {
                minute: Window::new(now),
                day: Window::new(now),
            });

        if let Err(wait) = budget.day.acquire(self.config.per_day, DAY, now) {
            warn!(provider, "daily request budget exhausted");
            return Err(wait);
        }
        if let Err(wait) = budget.minute.acquire(self.config.per_minute, MINUTE, now) {
            // Hand the daily slot back: the request never goes out.
            budget.day.count -= 1;
            return Err(wait);
        }
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        RateLimiter::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_minute: u32, per_day: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            per_minute,
            per_day,
        })
    }

    #[tokio::test]
    async fn test_minute_budget_exhausts() {
        let rl = limiter(3, 100);
        for _ in 0..3 {
            assert!(rl.try_acquire("cricketdata").is_ok());
        }
        let wait = rl.try_acquire("cricketdata").unwrap_err();
        assert!(wait <= MINUTE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minute_window_resets() {
        let rl = limiter(1, 100);
        assert!(rl.try_acquire("p").is_ok());
        assert!(rl.try_acquire("p").is_err());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(rl.try_acquire("p").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_day_budget_outlives_minute_resets() {
        let rl = limiter(10, 2);
        assert!(rl.try_acquire("p").is_ok());
        assert!(rl.try_acquire("p").is_ok());

        tokio::time::advance(Duration::from_secs(61)).await;
        let wait = rl.try_acquire("p").unwrap_err();
        assert!(wait > MINUTE, "must wait for the daily window, not the minute");
    }

    #[tokio::test]
    async fn test_providers_have_independent_budgets() {
        let rl = limiter(1, 100);
        assert!(rl.try_acquire("a").is_ok());
        assert!(rl.try_acquire("a").is_err());
        assert!(rl.try_acquire("b").is_ok());
    }

    #[tokio::test]
    async fn test_denied_minute_slot_does_not_burn_daily_budget() {
        let rl = limiter(1, 2);
        assert!(rl.try_acquire("p").is_ok());
        // Denied by the minute window; the daily slot must be handed back.
        assert!(rl.try_acquire("p").is_err());
        assert!(rl.try_acquire("p").is_err());
        {
            let budgets = rl.budgets.lock().unwrap();
            assert_eq!(budgets.get("p").unwrap().day.count, 1);
        }
    }
}
