//! Fan-out across sport providers and merging of their result sets.
//!
//! Providers are polled concurrently; one provider failing (or timing out
//! upstream) never fails the combined call. Its branch is logged and
//! replaced with an empty list.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::model::{Match, MatchStatus, Series, Sport};

/// Trait every per-sport fetcher implements. Implementations read through
/// the cache service, so calling these repeatedly is cheap.
#[async_trait]
pub trait SportProvider: Send + Sync {
    /// Sport this provider serves.
    fn sport(&self) -> Sport;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Matches currently in play.
    async fn live_matches(&self) -> Result<Vec<Match>>;

    /// Scheduled matches starting within the next `window_days`.
    async fn upcoming_matches(&self, window_days: i64) -> Result<Vec<Match>>;

    /// Completed matches from the trailing `window_days`.
    async fn recent_matches(&self, window_days: i64) -> Result<Vec<Match>>;

    /// Leagues / series this provider knows about.
    async fn leagues(&self) -> Result<Vec<Series>>;
}

/// Merges result sets from all registered providers.
pub struct Aggregator {
    providers: Vec<Arc<dyn SportProvider>>,
}

impl Aggregator {
    pub fn new(providers: Vec<Arc<dyn SportProvider>>) -> Self {
        Aggregator { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Fan out one operation to every provider, substituting an empty list
    /// for failed branches.
    async fn fan_out<'a, F>(&'a self, what: &str, op: F) -> Vec<Match>
    where
        F: Fn(
            &'a Arc<dyn SportProvider>,
        ) -> futures_util::future::BoxFuture<'a, Result<Vec<Match>>>,
    {
        let branches = self.providers.iter().map(|provider| {
            let fut = op(provider);
            async move { (provider.name(), provider.sport(), fut.await) }
        });

        let mut merged = Vec::new();
        for (name, sport, result) in join_all(branches).await {
            match result {
                Ok(matches) => {
                    debug!(provider = name, sport = %sport, count = matches.len(), what, "branch ok");
                    merged.extend(matches);
                }
                Err(err) => {
                    warn!(provider = name, sport = %sport, what, "provider branch failed: {err:#}");
                }
            }
        }
        merged
    }

    /// All matches currently in play, across every sport.
    ///
    /// Sort contract: sport name lexicographic, then start time ascending.
    pub async fn all_live(&self) -> Vec<Match> {
        let mut matches = self.fan_out("live", |p| p.live_matches()).await;
        matches.retain(|m| m.fixture.status.is_live());
        matches.sort_by(|a, b| {
            a.sport
                .as_str()
                .cmp(b.sport.as_str())
                .then(a.fixture.start_time.cmp(&b.fixture.start_time))
        });
        matches
    }

    /// Scheduled matches with `now < start_time <= now + window_days`,
    /// sorted by start time ascending.
    pub async fn upcoming(&self, window_days: i64) -> Vec<Match> {
        let now = Utc::now();
        let horizon = now + Duration::days(window_days);
        let mut matches = self
            .fan_out("upcoming", move |p| p.upcoming_matches(window_days))
            .await;
        matches.retain(|m| {
            m.fixture.status == MatchStatus::NotStarted
                && m.fixture
                    .start_time
                    .map(|t| t > now && t <= horizon)
                    .unwrap_or(false)
        });
        matches.sort_by_key(|m| m.fixture.start_time);
        matches
    }

    /// Completed matches from the trailing `window_days`, newest first.
    pub async fn recent(&self, window_days: i64) -> Vec<Match> {
        let cutoff = Utc::now() - Duration::days(window_days);
        let mut matches = self
            .fan_out("recent", move |p| p.recent_matches(window_days))
            .await;
        matches.retain(|m| {
            m.fixture.status.is_finished()
                && m.fixture.start_time.map(|t| t >= cutoff).unwrap_or(false)
        });
        matches.sort_by_key(|m| std::cmp::Reverse(m.fixture.start_time));
        matches
    }

    /// Merged league/series lists; failed branches are skipped.
    pub async fn leagues(&self) -> Vec<Series> {
        let branches = self.providers.iter().map(|provider| async move {
            (provider.name(), provider.leagues().await)
        });
        let mut merged = Vec::new();
        for (name, result) in join_all(branches).await {
            match result {
                Ok(series) => merged.extend(series),
                Err(err) => warn!(provider = name, "leagues branch failed: {err:#}"),
            }
        }
        merged
    }
}
