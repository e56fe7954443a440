//! Generic api-sports provider (football and basketball hosts).
//!
//! Upstream: `{"response": [...]}` envelope, `x-apisports-key` header
//! credential. One instance per sport: the hosts differ but the request
//! shapes are close enough to share the implementation.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::aggregator::SportProvider;
use crate::cache::{cache_key, CacheClass, CacheService};
use crate::model::{Match, Series, Sport};
use crate::normalize::{basketball, football};
use crate::upstream::UpstreamClient;

use super::normalize_batch;

pub struct ApiSportsProvider {
    sport: Sport,
    name: String,
    client: UpstreamClient,
    cache: CacheService,
}

impl std::fmt::Debug for ApiSportsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSportsProvider")
            .field("sport", &self.sport)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ApiSportsProvider {
    /// Build a provider for one api-sports host. Cricket is not an
    /// api-sports product; asking for it is a caller bug.
    pub fn new(sport: Sport, client: UpstreamClient, cache: CacheService) -> Result<Self> {
        if sport == Sport::Cricket {
            anyhow::bail!("api-sports provider does not serve cricket");
        }
        Ok(ApiSportsProvider {
            sport,
            name: format!("api-sports-{sport}"),
            client,
            cache,
        })
    }

    fn matches_path(&self) -> &'static str {
        match self.sport {
            Sport::Football => "fixtures",
            _ => "games",
        }
    }

    /// Matches in a date range, cached under the given class.
    async fn matches_between(
        &self,
        label: &str,
        from_days: i64,
        to_days: i64,
        class: CacheClass,
    ) -> Result<Vec<Match>> {
        let today = Utc::now().date_naive();
        let from = (today + Duration::days(from_days)).format("%Y-%m-%d").to_string();
        let to = (today + Duration::days(to_days)).format("%Y-%m-%d").to_string();
        let params = [("from", from.as_str()), ("to", to.as_str())];

        let key = cache_key(&format!("{}/{label}", self.sport), &params);
        let sport = self.sport;
        let client = self.client.clone();
        let path = self.matches_path();
        let owned: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.cache
            .get_or_fetch(&key, class, async move {
                let borrowed: Vec<(&str, &str)> =
                    owned.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                let raw = client.get_json(path, &borrowed).await?;
                Ok(normalize_batch(&raw, sport))
            })
            .await
    }
}

#[async_trait]
impl SportProvider for ApiSportsProvider {
    fn sport(&self) -> Sport {
        self.sport
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn live_matches(&self) -> Result<Vec<Match>> {
        let key = cache_key(&format!("{}/live", self.sport), &[("live", "all")]);
        let sport = self.sport;
        let client = self.client.clone();
        let path = self.matches_path();
        self.cache
            .get_or_fetch(&key, CacheClass::Live, async move {
                let raw = client.get_json(path, &[("live", "all")]).await?;
                Ok(normalize_batch(&raw, sport))
            })
            .await
    }

    async fn upcoming_matches(&self, window_days: i64) -> Result<Vec<Match>> {
        self.matches_between("upcoming", 0, window_days, CacheClass::Upcoming)
            .await
    }

    async fn recent_matches(&self, window_days: i64) -> Result<Vec<Match>> {
        self.matches_between("recent", -window_days, 0, CacheClass::Recent)
            .await
    }

    async fn leagues(&self) -> Result<Vec<Series>> {
        let key = cache_key(&format!("{}/leagues", self.sport), &[]);
        let sport = self.sport;
        let client = self.client.clone();
        self.cache
            .get_or_fetch(&key, CacheClass::Leagues, async move {
                let normalize = match sport {
                    Sport::Football => football::normalize_league,
                    _ => basketball::normalize_league,
                };
                let raw = client.get_json("leagues", &[]).await?;
                let series: Vec<Series> = raw
                    .as_array()
                    .map(|items| items.iter().filter_map(normalize).collect())
                    .unwrap_or_default();
                Ok(series)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::upstream::{ApiCredential, RateLimiter, RetryPolicy};

    fn client() -> UpstreamClient {
        UpstreamClient::new(
            "test",
            "https://example.com/",
            ApiCredential::None,
            RetryPolicy::default(),
            RateLimiter::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_cricket_is_rejected() {
        let err = ApiSportsProvider::new(
            Sport::Cricket,
            client(),
            CacheService::new(CacheConfig::default()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("cricket"));
    }

    #[test]
    fn test_paths_per_sport() {
        let cache = CacheService::new(CacheConfig::default());
        let football = ApiSportsProvider::new(Sport::Football, client(), cache.clone()).unwrap();
        let basketball =
            ApiSportsProvider::new(Sport::Basketball, client(), cache).unwrap();
        assert_eq!(football.matches_path(), "fixtures");
        assert_eq!(basketball.matches_path(), "games");
        assert_eq!(football.name(), "api-sports-football");
    }
}
