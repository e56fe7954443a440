//! Cricket data provider.
//!
//! Upstream: cricket data API with an `{"status": "success", "data": [...]}`
//! envelope and an `apikey` query-param credential. `currentMatches` carries
//! both in-play and recently finished games, so the live and recent views
//! read the same endpoint under different cache classes.

use anyhow::Result;
use async_trait::async_trait;

use crate::aggregator::SportProvider;
use crate::cache::{cache_key, CacheClass, CacheService};
use crate::model::{Match, Series, Sport};
use crate::normalize::cricket::normalize_series;
use crate::upstream::UpstreamClient;

use super::normalize_batch;

pub struct CricketDataProvider {
    client: UpstreamClient,
    cache: CacheService,
}

impl CricketDataProvider {
    pub fn new(client: UpstreamClient, cache: CacheService) -> Self {
        CricketDataProvider { client, cache }
    }

    /// Current matches (live + just finished), cached per class so the live
    /// view refreshes on the live cadence and the recent view on its own.
    async fn current_matches(&self, class: CacheClass) -> Result<Vec<Match>> {
        let key = cache_key(
            &format!("cricket/currentMatches/{}", class.as_str()),
            &[("offset", "0")],
        );
        let client = self.client.clone();
        self.cache
            .get_or_fetch(&key, class, async move {
                let raw = client.get_json("currentMatches", &[("offset", "0")]).await?;
                Ok(normalize_batch(&raw, Sport::Cricket))
            })
            .await
    }
}

#[async_trait]
impl SportProvider for CricketDataProvider {
    fn sport(&self) -> Sport {
        Sport::Cricket
    }

    fn name(&self) -> &str {
        "cricketdata"
    }

    async fn live_matches(&self) -> Result<Vec<Match>> {
        let mut matches = self.current_matches(CacheClass::Live).await?;
        matches.retain(|m| m.fixture.status.is_live());
        Ok(matches)
    }

    async fn upcoming_matches(&self, _window_days: i64) -> Result<Vec<Match>> {
        // The fixtures list is small; the aggregator applies the window.
        let key = cache_key("cricket/matches", &[("offset", "0")]);
        let client = self.client.clone();
        self.cache
            .get_or_fetch(&key, CacheClass::Upcoming, async move {
                let raw = client.get_json("matches", &[("offset", "0")]).await?;
                Ok(normalize_batch(&raw, Sport::Cricket))
            })
            .await
    }

    async fn recent_matches(&self, _window_days: i64) -> Result<Vec<Match>> {
        let mut matches = self.current_matches(CacheClass::Recent).await?;
        matches.retain(|m| m.fixture.status.is_finished());
        Ok(matches)
    }

    async fn leagues(&self) -> Result<Vec<Series>> {
        let key = cache_key("cricket/series", &[("offset", "0")]);
        let client = self.client.clone();
        self.cache
            .get_or_fetch(&key, CacheClass::Leagues, async move {
                let raw = client.get_json("series", &[("offset", "0")]).await?;
                let series: Vec<Series> = raw
                    .as_array()
                    .map(|items| items.iter().filter_map(normalize_series).collect())
                    .unwrap_or_default();
                Ok(series)
            })
            .await
    }
}
