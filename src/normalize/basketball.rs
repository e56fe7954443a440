//! Basketball normalization for the api-sports family.
//!
//! Raw shape differs from football: flat `{id, date, status, league, country,
//! teams, scores}` with per-quarter score blocks and quarter-based statuses.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::model::{Fixture, League, Match, MatchStatus, Score, Series, Sport, Team};

use super::{derive_short_name, id_string, int_field, parse_datetime};

fn map_status(short: &str) -> Option<MatchStatus> {
    match short {
        "NS" => Some(MatchStatus::NotStarted),
        "Q1" | "Q2" | "Q3" | "Q4" | "OT" | "BT" | "LIVE" => Some(MatchStatus::Live),
        "HT" => Some(MatchStatus::HalfTime),
        "FT" | "AOT" => Some(MatchStatus::Finished),
        "POST" | "PST" => Some(MatchStatus::Postponed),
        "CANC" => Some(MatchStatus::Cancelled),
        "SUSP" => Some(MatchStatus::Suspended),
        "AWD" => Some(MatchStatus::Awarded),
        "ABD" => Some(MatchStatus::Abandoned),
        "WO" => Some(MatchStatus::Walkover),
        _ => None,
    }
}

/// Current period as the elapsed indicator ("Q3" → 3, overtime → 5).
fn elapsed_from(short: &str) -> Option<i32> {
    match short {
        "Q1" => Some(1),
        "Q2" => Some(2),
        "Q3" => Some(3),
        "Q4" => Some(4),
        "OT" | "AOT" => Some(5),
        _ => None,
    }
}

fn build_team(raw: &Value) -> Option<Team> {
    let name = raw["name"].as_str()?;
    Some(Team {
        id: id_string(&raw["id"]).unwrap_or_default(),
        name: name.to_string(),
        short_name: derive_short_name(name),
        logo: raw["logo"].as_str().map(str::to_string),
    })
}

pub fn normalize_match(raw: &Value) -> Option<Match> {
    let id = id_string(&raw["id"])?;
    // Both fixture-style and flat payloads exist; require the flat teams.
    let home = build_team(&raw["teams"]["home"])?;
    let away = build_team(&raw["teams"]["away"])?;

    let short = raw["status"]["short"].as_str().unwrap_or("");
    let status = map_status(short).unwrap_or_else(|| {
        warn!(status = short, "unknown basketball status, defaulting to NS");
        MatchStatus::NotStarted
    });

    let home_total = int_field(&raw["scores"]["home"]["total"]);
    let away_total = int_field(&raw["scores"]["away"]["total"]);
    let detail = match (home_total, away_total) {
        (Some(h), Some(a)) => Some(format!("{h} - {a}")),
        _ => None,
    };

    let mut extras = Map::new();
    for side in ["home", "away"] {
        let quarters = &raw["scores"][side];
        if quarters.is_object() {
            extras.insert(format!("{side}_quarters"), quarters.clone());
        }
    }
    if let Some(timer) = raw["status"]["timer"].as_str() {
        extras.insert("timer".into(), json!(timer));
    }

    Some(Match {
        id,
        sport: Sport::Basketball,
        league: League {
            id: id_string(&raw["league"]["id"]).unwrap_or_default(),
            name: raw["league"]["name"].as_str().unwrap_or("").to_string(),
            country: raw["country"]["name"]
                .as_str()
                .or_else(|| raw["league"]["country"].as_str())
                .map(str::to_string),
        },
        home,
        away,
        fixture: Fixture {
            start_time: raw["date"].as_str().and_then(parse_datetime),
            venue: raw["venue"].as_str().map(str::to_string),
            status,
            elapsed: elapsed_from(short),
        },
        score: Score {
            home: home_total,
            away: away_total,
            detail,
        },
        extras,
    })
}

/// Normalize a basketball league record (flat `{id, name, type, seasons}`
/// shape) into a [`Series`].
pub fn normalize_league(raw: &Value) -> Option<Series> {
    let id = id_string(&raw["id"])?;
    let name = raw["name"].as_str()?.to_string();

    let season = raw["seasons"].as_array().and_then(|s| s.last());

    Some(Series {
        id,
        name,
        sport: Sport::Basketball,
        status: raw["type"].as_str().map(str::to_string),
        start_date: season
            .and_then(|s| s["start"].as_str())
            .and_then(parse_datetime),
        end_date: season
            .and_then(|s| s["end"].as_str())
            .and_then(parse_datetime),
        match_counts: Map::new(),
    })
}
