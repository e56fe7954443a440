//! Periodic sync of aggregated results into a keyed store.
//!
//! The scheduler is the only writer: every cycle it pulls the combined
//! live/upcoming/recent views from the aggregator and upserts them under
//! `sport/match_id` paths. Store and aggregator failures are logged and the
//! loop keeps running.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::model::{Match, Series};
use crate::normalize::format_match_for_display;

/// Keyed store the scheduler writes into. Plain serializable payloads only,
/// so a remote document store can implement this just as well as SQLite.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Upsert one match under its `sport/match_id` path.
    async fn put_match(&self, m: &Match) -> Result<()>;

    /// Upsert one series under `sport/series/id`.
    async fn put_series(&self, s: &Series) -> Result<()>;
}

/// SQLite-backed store: one `entries(path, payload, updated_at)` table.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS entries (
    path       TEXT PRIMARY KEY,
    payload    TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// In-memory store for tests.
    #[allow(dead_code)]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn upsert(&self, path: &str, payload: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO entries (path, payload, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(path) DO UPDATE SET payload=excluded.payload,
                                             updated_at=excluded.updated_at",
            params![path, payload, Utc::now()],
        )?;
        Ok(())
    }

    /// Read one payload back, mainly for verification.
    #[allow(dead_code)]
    pub fn get(&self, path: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM entries WHERE path=?1",
                params![path],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(payload.map(|p| serde_json::from_str(&p)).transpose()?)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl MatchStore for SqliteStore {
    async fn put_match(&self, m: &Match) -> Result<()> {
        self.upsert(&m.store_path(), &serde_json::to_string(m)?)
    }

    async fn put_series(&self, s: &Series) -> Result<()> {
        let path = format!("{}/series/{}", s.sport, s.id);
        self.upsert(&path, &serde_json::to_string(s)?)
    }
}

/// Drives the aggregator on a fixed interval and persists what comes back.
pub struct SyncScheduler {
    aggregator: Arc<Aggregator>,
    store: Arc<dyn MatchStore>,
    interval: Duration,
    upcoming_window_days: i64,
    recent_window_days: i64,
}

impl SyncScheduler {
    pub fn new(
        aggregator: Arc<Aggregator>,
        store: Arc<dyn MatchStore>,
        interval: Duration,
        upcoming_window_days: i64,
        recent_window_days: i64,
    ) -> Self {
        SyncScheduler {
            aggregator,
            store,
            interval,
            upcoming_window_days,
            recent_window_days,
        }
    }

    /// Run forever. A failed cycle is logged, never fatal.
    pub async fn run(self) {
        info!(interval = ?self.interval, "sync scheduler started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.sync_once().await;
        }
    }

    /// One full cycle: fetch every view, persist everything fetched.
    pub async fn sync_once(&self) {
        let live = self.aggregator.all_live().await;
        let upcoming = self.aggregator.upcoming(self.upcoming_window_days).await;
        let recent = self.aggregator.recent(self.recent_window_days).await;
        let leagues = self.aggregator.leagues().await;

        for m in &live {
            let d = format_match_for_display(m);
            debug!("{} | {} | {} ({})", d.title, d.scoreline, d.status, d.league);
        }

        let mut stored = 0usize;
        for m in live.iter().chain(upcoming.iter()).chain(recent.iter()) {
            match self.store.put_match(m).await {
                Ok(()) => stored += 1,
                Err(e) => warn!(path = %m.store_path(), "store write failed: {e:#}"),
            }
        }
        for s in &leagues {
            if let Err(e) = self.store.put_series(s).await {
                warn!(series = %s.id, "store write failed: {e:#}");
            }
        }

        info!(
            live = live.len(),
            upcoming = upcoming.len(),
            recent = recent.len(),
            leagues = leagues.len(),
            stored,
            "sync cycle complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SportProvider;
    use crate::model::{Fixture, League, MatchStatus, Score, Sport, Team};

    fn live_match(id: &str) -> Match {
        Match {
            id: id.into(),
            sport: Sport::Cricket,
            league: League::default(),
            home: Team::default(),
            away: Team::default(),
            fixture: Fixture {
                start_time: Some(Utc::now()),
                venue: None,
                status: MatchStatus::Live,
                elapsed: None,
            },
            score: Score {
                home: Some(287),
                away: None,
                detail: Some("287/4 (48.3)".into()),
            },
            extras: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_store_roundtrip_under_sport_path() {
        let store = SqliteStore::open_in_memory().unwrap();
        let m = live_match("m-1");
        store.put_match(&m).await.unwrap();

        let payload = store.get("cricket/m-1").unwrap().unwrap();
        assert_eq!(payload["score"]["detail"], "287/4 (48.3)");
        assert_eq!(payload["fixture"]["status"], "LIVE");
    }

    #[tokio::test]
    async fn test_store_upsert_overwrites() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut m = live_match("m-1");
        store.put_match(&m).await.unwrap();

        m.score.home = Some(301);
        store.put_match(&m).await.unwrap();

        assert_eq!(store.len().unwrap(), 1);
        let payload = store.get("cricket/m-1").unwrap().unwrap();
        assert_eq!(payload["score"]["home"], 301);
    }

    struct OneMatchProvider;

    #[async_trait]
    impl SportProvider for OneMatchProvider {
        fn sport(&self) -> Sport {
            Sport::Cricket
        }
        fn name(&self) -> &str {
            "one-match"
        }
        async fn live_matches(&self) -> Result<Vec<Match>> {
            Ok(vec![live_match("m-9")])
        }
        async fn upcoming_matches(&self, _w: i64) -> Result<Vec<Match>> {
            Ok(vec![])
        }
        async fn recent_matches(&self, _w: i64) -> Result<Vec<Match>> {
            Ok(vec![])
        }
        async fn leagues(&self) -> Result<Vec<Series>> {
            anyhow::bail!("leagues endpoint down")
        }
    }

    #[tokio::test]
    async fn test_sync_once_persists_and_survives_branch_failure() {
        let store = SqliteStore::open_in_memory().unwrap();
        let aggregator = Arc::new(Aggregator::new(vec![Arc::new(OneMatchProvider)]));
        let scheduler = SyncScheduler::new(
            aggregator,
            Arc::new(store.clone()),
            Duration::from_secs(60),
            7,
            1,
        );

        scheduler.sync_once().await;
        assert!(store.get("cricket/m-9").unwrap().is_some());
    }
}
