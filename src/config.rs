use clap::Parser;

/// Multi-sport live score aggregator
#[derive(Parser, Debug, Clone)]
#[command(name = "scorehub", version, about)]
pub struct Config {
    /// Cricket data API base URL
    #[arg(
        long,
        env = "CRICKET_API_URL",
        default_value = "https://api.cricapi.com/v1/"
    )]
    pub cricket_api_url: String,

    /// Cricket data API key (provider skipped if unset)
    #[arg(long, env = "CRICKET_API_KEY")]
    pub cricket_api_key: Option<String>,

    /// api-sports football base URL
    #[arg(
        long,
        env = "FOOTBALL_API_URL",
        default_value = "https://v3.football.api-sports.io/"
    )]
    pub football_api_url: String,

    /// api-sports basketball base URL
    #[arg(
        long,
        env = "BASKETBALL_API_URL",
        default_value = "https://v1.basketball.api-sports.io/"
    )]
    pub basketball_api_url: String,

    /// api-sports API key, shared by the football and basketball hosts
    /// (providers skipped if unset)
    #[arg(long, env = "APISPORTS_KEY")]
    pub apisports_key: Option<String>,

    /// Sports to aggregate (comma-separated)
    #[arg(
        long,
        env = "SPORTS",
        value_delimiter = ',',
        default_value = "cricket,football,basketball"
    )]
    pub sports: Vec<String>,

    /// SQLite store path for synced results
    #[arg(long, env = "DATABASE_PATH", default_value = "scorehub.db")]
    pub database_path: String,

    /// Seconds between sync cycles
    #[arg(long, env = "SYNC_INTERVAL_SECS", default_value = "60")]
    pub sync_interval_secs: u64,

    /// How many days ahead the upcoming view reaches
    #[arg(long, env = "UPCOMING_WINDOW_DAYS", default_value = "7")]
    pub upcoming_window_days: i64,

    /// How many days back the recent view reaches
    #[arg(long, env = "RECENT_WINDOW_DAYS", default_value = "1")]
    pub recent_window_days: i64,

    /// Maximum number of cache entries (LRU bound)
    #[arg(long, env = "CACHE_MAX_ENTRIES", default_value = "500")]
    pub cache_max_entries: usize,

    /// Upstream request budget per provider per minute
    #[arg(long, env = "RATE_LIMIT_PER_MINUTE", default_value = "10")]
    pub rate_limit_per_minute: u32,

    /// Upstream request budget per provider per day
    #[arg(long, env = "RATE_LIMIT_PER_DAY", default_value = "100")]
    pub rate_limit_per_day: u32,

    /// Retries per upstream request on transient failures
    #[arg(long, env = "UPSTREAM_MAX_RETRIES", default_value = "3")]
    pub upstream_max_retries: u32,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sports.is_empty() {
            anyhow::bail!("at least one sport must be enabled");
        }
        if self.sync_interval_secs == 0 {
            anyhow::bail!("sync_interval_secs must be positive");
        }
        if self.upcoming_window_days <= 0 {
            anyhow::bail!("upcoming_window_days must be positive");
        }
        if self.recent_window_days <= 0 {
            anyhow::bail!("recent_window_days must be positive");
        }
        if self.cache_max_entries == 0 {
            anyhow::bail!("cache_max_entries must be positive");
        }
        if self.rate_limit_per_minute == 0 || self.rate_limit_per_day == 0 {
            anyhow::bail!("rate limits must be positive");
        }
        if self.rate_limit_per_day < self.rate_limit_per_minute {
            anyhow::bail!("rate_limit_per_day must be at least rate_limit_per_minute");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config::parse_from(["scorehub"])
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = base_config();
        config.sync_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inconsistent_rate_limits_rejected() {
        let mut config = base_config();
        config.rate_limit_per_minute = 50;
        config.rate_limit_per_day = 10;
        assert!(config.validate().is_err());
    }
}
