//! Presentation-ready view of a normalized match.

use serde::{Deserialize, Serialize};

use crate::model::{Match, MatchStatus};

/// Derived display fields. Produced from a [`Match`] by a pure transform;
/// holds no references back into the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDisplay {
    /// "Manchester United vs Chelsea"
    pub title: String,
    /// "Premier League (England)"
    pub league: String,
    /// "LIVE 64'" / "HT" / "Not Started"
    pub status: String,
    /// Long-form status: "In Progress", "Half Time", ...
    pub status_detail: String,
    /// Sport-specific detail when present, else "2 - 1", else "-"
    pub scoreline: String,
    /// RFC 3339 kickoff time, if known
    pub start_time: Option<String>,
}

/// Build the display view. Never mutates the input; calling it twice on the
/// same match yields identical output.
pub fn format_match_for_display(m: &Match) -> MatchDisplay {
    let league = match &m.league.country {
        Some(country) if !country.is_empty() => format!("{} ({})", m.league.name, country),
        _ => m.league.name.clone(),
    };

    let status = match (m.fixture.status, m.fixture.elapsed) {
        (MatchStatus::Live, Some(elapsed)) => format!("LIVE {elapsed}'"),
        (MatchStatus::NotStarted, _) => "Not Started".to_string(),
        (other, _) => other.short().to_string(),
    };

    let scoreline = m.score.detail.clone().unwrap_or_else(|| {
        match (m.score.home, m.score.away) {
            (Some(h), Some(a)) => format!("{h} - {a}"),
            _ => "-".to_string(),
        }
    });

    MatchDisplay {
        title: format!("{} vs {}", m.home.name, m.away.name),
        league,
        status,
        status_detail: m.fixture.status.long().to_string(),
        scoreline,
        start_time: m.fixture.start_time.map(|t| t.to_rfc3339()),
    }
}
