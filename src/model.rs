use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sports covered by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Basketball,
    Cricket,
    Football,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Basketball => "basketball",
            Sport::Cricket => "cricket",
            Sport::Football => "football",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = anyhow::Error;

    /// Contract errors fail fast: an unsupported sport key is a caller bug,
    /// not an upstream condition.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cricket" => Ok(Sport::Cricket),
            "football" | "soccer" => Ok(Sport::Football),
            "basketball" => Ok(Sport::Basketball),
            other => anyhow::bail!(
                "unsupported sport '{}' (expected cricket, football or basketball)",
                other
            ),
        }
    }
}

/// Canonical match status. Every provider vocabulary is translated into this
/// set; nothing past the normalizer sees a raw status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "NS")]
    NotStarted,
    #[serde(rename = "LIVE")]
    Live,
    #[serde(rename = "HT")]
    HalfTime,
    #[serde(rename = "FT")]
    Finished,
    #[serde(rename = "CANC")]
    Cancelled,
    #[serde(rename = "SUSP")]
    Suspended,
    #[serde(rename = "AWD")]
    Awarded,
    #[serde(rename = "ABD")]
    Abandoned,
    #[serde(rename = "WO")]
    Walkover,
    #[serde(rename = "PST")]
    Postponed,
}

impl MatchStatus {
    /// Short code as served to consumers ("NS", "LIVE", ...).
    pub fn short(&self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "NS",
            MatchStatus::Live => "LIVE",
            MatchStatus::HalfTime => "HT",
            MatchStatus::Finished => "FT",
            MatchStatus::Cancelled => "CANC",
            MatchStatus::Suspended => "SUSP",
            MatchStatus::Awarded => "AWD",
            MatchStatus::Abandoned => "ABD",
            MatchStatus::Walkover => "WO",
            MatchStatus::Postponed => "PST",
        }
    }

    pub fn long(&self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "Not Started",
            MatchStatus::Live => "In Progress",
            MatchStatus::HalfTime => "Half Time",
            MatchStatus::Finished => "Finished",
            MatchStatus::Cancelled => "Cancelled",
            MatchStatus::Suspended => "Suspended",
            MatchStatus::Awarded => "Awarded",
            MatchStatus::Abandoned => "Abandoned",
            MatchStatus::Walkover => "Walkover",
            MatchStatus::Postponed => "Postponed",
        }
    }

    /// In-play statuses (drives the "all live" views).
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            MatchStatus::Live | MatchStatus::HalfTime | MatchStatus::Suspended
        )
    }

    /// Statuses that count as a completed result.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            MatchStatus::Finished | MatchStatus::Awarded | MatchStatus::Walkover
        )
    }
}

/// League / competition a match belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
}

/// One side of a fixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub logo: Option<String>,
}

/// Scheduling and status block of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub start_time: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub status: MatchStatus,
    /// Minutes elapsed (football) or current period (basketball), if known.
    pub elapsed: Option<i32>,
}

/// Reconciled score. `home`/`away` are the headline numbers (goals, points,
/// runs); `detail` keeps the sport-specific rendering, e.g. "287/4 (48.3)".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub home: Option<i64>,
    pub away: Option<i64>,
    pub detail: Option<String>,
}

/// Normalized match entity. Built fresh on every normalization call and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Provider-scoped ID, unique within one sport.
    pub id: String,
    pub sport: Sport,
    pub league: League,
    pub home: Team,
    pub away: Team,
    pub fixture: Fixture,
    pub score: Score,
    /// Sport-specific leftovers (innings breakdown, period scores, toss...).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extras: serde_json::Map<String, serde_json::Value>,
}

impl Match {
    /// Store path under which the sync scheduler persists this match.
    pub fn store_path(&self) -> String {
        format!("{}/{}", self.sport, self.id)
    }
}

/// Normalized series / season entity (cricket series, league seasons).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub name: String,
    pub sport: Sport,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Match counts per format, e.g. {"odi": 3, "t20": 5}.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub match_counts: serde_json::Map<String, serde_json::Value>,
}
