use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

mod aggregator;
mod cache;
mod config;
mod model;
mod normalize;
mod providers;
mod sync;
mod upstream;

use aggregator::{Aggregator, SportProvider};
use cache::{CacheConfig, CacheService};
use config::Config;
use model::Sport;
use providers::{ApiSportsProvider, CricketDataProvider};
use sync::{SqliteStore, SyncScheduler};
use upstream::{ApiCredential, RateLimitConfig, RateLimiter, RetryPolicy, UpstreamClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // An unknown sport key is a configuration bug: fail fast, don't skip.
    let enabled: Vec<Sport> = config
        .sports
        .iter()
        .map(|s| s.parse())
        .collect::<Result<_>>()?;

    let cache = CacheService::new(CacheConfig {
        max_entries: config.cache_max_entries,
        ..CacheConfig::default()
    });
    let limiter = RateLimiter::new(RateLimitConfig {
        per_minute: config.rate_limit_per_minute,
        per_day: config.rate_limit_per_day,
    });
    let retry = RetryPolicy {
        max_retries: config.upstream_max_retries,
        ..RetryPolicy::default()
    };

    // Build one provider per configured upstream.
    let mut sport_providers: Vec<Arc<dyn SportProvider>> = Vec::new();

    if enabled.contains(&Sport::Cricket) {
        match &config.cricket_api_key {
            Some(key) => {
                let client = UpstreamClient::new(
                    "cricketdata",
                    &config.cricket_api_url,
                    ApiCredential::QueryParam {
                        name: "apikey".into(),
                        value: key.clone(),
                    },
                    retry,
                    limiter.clone(),
                )?;
                sport_providers.push(Arc::new(CricketDataProvider::new(client, cache.clone())));
            }
            None => warn!("CRICKET_API_KEY not set, cricket provider disabled"),
        }
    }

    for (sport, base_url) in [
        (Sport::Football, &config.football_api_url),
        (Sport::Basketball, &config.basketball_api_url),
    ] {
        if !enabled.contains(&sport) {
            continue;
        }
        match &config.apisports_key {
            Some(key) => {
                let client = UpstreamClient::new(
                    &format!("api-sports-{sport}"),
                    base_url,
                    ApiCredential::Header {
                        name: "x-apisports-key".into(),
                        value: key.clone(),
                    },
                    retry,
                    limiter.clone(),
                )?;
                sport_providers.push(Arc::new(ApiSportsProvider::new(
                    sport,
                    client,
                    cache.clone(),
                )?));
            }
            None => warn!("APISPORTS_KEY not set, {sport} provider disabled"),
        }
    }

    if sport_providers.is_empty() {
        anyhow::bail!("no providers configured; set CRICKET_API_KEY and/or APISPORTS_KEY");
    }

    let aggregator = Arc::new(Aggregator::new(sport_providers));
    info!("Configured providers: {:?}", aggregator.provider_names());

    let store = SqliteStore::open(&config.database_path)?;
    info!("Store opened: {}", config.database_path);

    let scheduler = SyncScheduler::new(
        aggregator,
        Arc::new(store),
        Duration::from_secs(config.sync_interval_secs),
        config.upcoming_window_days,
        config.recent_window_days,
    );

    // Run until interrupted; the scheduler loop never returns on its own.
    tokio::select! {
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
