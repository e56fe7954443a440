//! Football normalization for the api-sports family.
//!
//! Raw shape: `{fixture: {id, date, venue, status: {short, long, elapsed}},
//! league, teams: {home, away}, goals, score: {halftime, fulltime, ...}}`.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::model::{Fixture, League, Match, MatchStatus, Score, Series, Sport, Team};

use super::{derive_short_name, id_string, int_field, parse_datetime};

/// api-sports short-code table. The provider's vocabulary is wider than the
/// canonical set, so several in-play codes collapse into LIVE.
fn map_status(short: &str) -> Option<MatchStatus> {
    match short {
        "NS" | "TBD" => Some(MatchStatus::NotStarted),
        "1H" | "2H" | "ET" | "BT" | "P" | "LIVE" => Some(MatchStatus::Live),
        "HT" => Some(MatchStatus::HalfTime),
        "FT" | "AET" | "PEN" => Some(MatchStatus::Finished),
        "SUSP" | "INT" => Some(MatchStatus::Suspended),
        "PST" => Some(MatchStatus::Postponed),
        "CANC" => Some(MatchStatus::Cancelled),
        "ABD" => Some(MatchStatus::Abandoned),
        "AWD" => Some(MatchStatus::Awarded),
        "WO" => Some(MatchStatus::Walkover),
        _ => None,
    }
}

fn status_from(fixture: &Value) -> MatchStatus {
    let short = fixture["status"]["short"].as_str().unwrap_or("");
    map_status(short).unwrap_or_else(|| {
        warn!(status = short, "unknown football status, defaulting to NS");
        MatchStatus::NotStarted
    })
}

fn build_team(raw: &Value) -> Option<Team> {
    let name = raw["name"].as_str()?;
    Some(Team {
        id: id_string(&raw["id"]).unwrap_or_default(),
        name: name.to_string(),
        short_name: raw["code"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| derive_short_name(name)),
        logo: raw["logo"].as_str().map(str::to_string),
    })
}

/// Headline goals, falling back from the live `goals` block to the
/// `score.fulltime` nesting some endpoints use instead.
fn goals(raw: &Value, side: &str) -> Option<i64> {
    int_field(&raw["goals"][side]).or_else(|| int_field(&raw["score"]["fulltime"][side]))
}

pub fn normalize_match(raw: &Value) -> Option<Match> {
    let fixture = raw.get("fixture")?;
    let id = id_string(&fixture["id"])?;
    let home = build_team(&raw["teams"]["home"])?;
    let away = build_team(&raw["teams"]["away"])?;

    let home_goals = goals(raw, "home");
    let away_goals = goals(raw, "away");
    let detail = match (home_goals, away_goals) {
        (Some(h), Some(a)) => Some(format!("{h} - {a}")),
        _ => None,
    };

    let mut extras = Map::new();
    if let Some(periods) = raw.get("score").filter(|s| s.is_object()) {
        extras.insert("periods".into(), periods.clone());
    }

    Some(Match {
        id,
        sport: Sport::Football,
        league: League {
            id: id_string(&raw["league"]["id"]).unwrap_or_default(),
            name: raw["league"]["name"].as_str().unwrap_or("").to_string(),
            country: raw["league"]["country"].as_str().map(str::to_string),
        },
        home,
        away,
        fixture: Fixture {
            start_time: fixture["date"].as_str().and_then(parse_datetime),
            venue: fixture["venue"]["name"].as_str().map(str::to_string),
            status: status_from(fixture),
            elapsed: fixture["status"]["elapsed"].as_i64().map(|e| e as i32),
        },
        score: Score {
            home: home_goals,
            away: away_goals,
            detail,
        },
        extras,
    })
}

/// Normalize a league record (`{league, country, seasons}` nesting) into a
/// [`Series`], using the current season for the date range.
pub fn normalize_league(raw: &Value) -> Option<Series> {
    let league = raw.get("league")?;
    let id = id_string(&league["id"])?;
    let name = league["name"].as_str()?.to_string();

    let seasons = raw["seasons"].as_array();
    let season = seasons.and_then(|s| {
        s.iter()
            .find(|x| x["current"].as_bool() == Some(true))
            .or_else(|| s.last())
    });

    Some(Series {
        id,
        name,
        sport: Sport::Football,
        status: league["type"].as_str().map(str::to_string),
        start_date: season
            .and_then(|s| s["start"].as_str())
            .and_then(parse_datetime),
        end_date: season
            .and_then(|s| s["end"].as_str())
            .and_then(parse_datetime),
        match_counts: Map::new(),
    })
}
