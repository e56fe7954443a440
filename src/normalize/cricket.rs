//! Cricket provider normalization.
//!
//! Raw shape (cricket data API, `currentMatches` / `series` endpoints):
//! string IDs, a `teams` array of names, an optional `teamInfo` array with
//! short names and logos, a free-text `status`, `matchStarted`/`matchEnded`
//! flags, and a `score` array of per-innings `{r, w, o, inning}` objects.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::model::{Fixture, League, Match, MatchStatus, Score, Series, Sport, Team};

use super::{derive_short_name, id_string, int_field, parse_datetime};

/// Innings score string: runs, optional `/wickets`, optional `(overs)`.
static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)(?:\s*/\s*(\d+))?(?:\s*\((\d+(?:\.\d+)?)\))?\s*$").unwrap()
});

/// A cricket innings score pulled apart from its string form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParsedScore {
    pub runs: Option<i64>,
    pub wickets: Option<i64>,
    pub overs: Option<f64>,
}

/// Parse `"287/4 (48.3)"`-style score strings. `"150"` is runs only;
/// anything unparseable is the all-`None` score, never an error.
pub fn parse_score_string(s: &str) -> ParsedScore {
    let Some(caps) = SCORE_RE.captures(s) else {
        return ParsedScore::default();
    };
    ParsedScore {
        runs: caps.get(1).and_then(|m| m.as_str().parse().ok()),
        wickets: caps.get(2).and_then(|m| m.as_str().parse().ok()),
        overs: caps.get(3).and_then(|m| m.as_str().parse().ok()),
    }
}

/// Status vocabulary seen from the cricket provider. Free-text results like
/// "Australia won by 5 wickets" fall through to the started/ended flags.
fn map_status(raw: &str) -> Option<MatchStatus> {
    match raw.to_lowercase().as_str() {
        "match not started" | "not started" | "upcoming" | "scheduled" | "fixture" => {
            Some(MatchStatus::NotStarted)
        }
        "live" | "in progress" | "innings break" | "stumps" | "lunch" | "tea" | "drinks" => {
            Some(MatchStatus::Live)
        }
        "rain delay" | "bad light" | "wet outfield" | "interrupted" => {
            Some(MatchStatus::Suspended)
        }
        "match ended" | "finished" | "complete" | "result" => Some(MatchStatus::Finished),
        "match abandoned" | "abandoned" | "abandoned due to rain" => Some(MatchStatus::Abandoned),
        "match cancelled" | "cancelled" | "canceled" | "no result" => Some(MatchStatus::Cancelled),
        "match postponed" | "postponed" => Some(MatchStatus::Postponed),
        "match awarded" | "awarded" => Some(MatchStatus::Awarded),
        "walkover" => Some(MatchStatus::Walkover),
        _ => None,
    }
}

fn status_from(raw: &Value) -> MatchStatus {
    let status_text = raw["status"].as_str().unwrap_or("");
    if let Some(status) = map_status(status_text) {
        return status;
    }

    // Result strings ("X won by ...") and anything else the table misses:
    // let the lifecycle flags decide.
    let started = raw["matchStarted"].as_bool();
    let ended = raw["matchEnded"].as_bool();
    match (started, ended) {
        (_, Some(true)) => MatchStatus::Finished,
        (Some(true), _) => MatchStatus::Live,
        (Some(false), _) => MatchStatus::NotStarted,
        _ => {
            if !status_text.is_empty() {
                warn!(status = status_text, "unknown cricket status, defaulting to NS");
            }
            MatchStatus::NotStarted
        }
    }
}

/// Look up short name / logo for a team name in the `teamInfo` array.
fn team_info<'a>(raw: &'a Value, name: &str) -> Option<&'a Value> {
    raw["teamInfo"]
        .as_array()?
        .iter()
        .find(|info| info["name"].as_str() == Some(name))
}

fn build_team(raw: &Value, name: &str) -> Team {
    let info = team_info(raw, name);
    let short_name = info
        .and_then(|i| i["shortname"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| derive_short_name(name));
    Team {
        id: name.to_lowercase().replace(' ', "-"),
        name: name.to_string(),
        short_name,
        logo: info.and_then(|i| i["img"].as_str()).map(str::to_string),
    }
}

/// Innings entries for one team, in the order the provider listed them.
/// Bare-string innings carry no team attribution and are skipped here.
fn innings_for<'a>(score: &'a [Value], team: &str) -> Vec<&'a Value> {
    score
        .iter()
        .filter(|inning| {
            inning["inning"]
                .as_str()
                .map(|s| s.starts_with(team))
                .unwrap_or(false)
        })
        .collect()
}

/// One innings entry, whichever of the provider's two shapes it arrived in:
/// an `{r, w, o}` object or a bare `"287/4 (48.3)"` string.
fn innings_score(inning: &Value) -> ParsedScore {
    if let Some(s) = inning.as_str() {
        return parse_score_string(s);
    }
    ParsedScore {
        runs: int_field(&inning["r"]),
        wickets: int_field(&inning["w"]),
        overs: inning["o"].as_f64(),
    }
}

fn format_score(parsed: ParsedScore) -> Option<String> {
    let runs = parsed.runs?;
    let mut out = runs.to_string();
    if let Some(w) = parsed.wickets {
        out.push_str(&format!("/{w}"));
    }
    if let Some(o) = parsed.overs {
        out.push_str(&format!(" ({o})"));
    }
    Some(out)
}

fn reconcile_score(raw: &Value, home: &str, away: &str) -> Score {
    let Some(score) = raw["score"].as_array() else {
        return Score::default();
    };

    let total = |team: &str| {
        let innings = innings_for(score, team);
        if innings.is_empty() {
            None
        } else {
            Some(
                innings
                    .iter()
                    .filter_map(|i| innings_score(i).runs)
                    .sum::<i64>(),
            )
        }
    };

    Score {
        home: total(home),
        away: total(away),
        // The provider appends innings in play order, so the last entry is
        // the one currently on the board.
        detail: score.last().map(|i| innings_score(i)).and_then(format_score),
    }
}

pub fn normalize_match(raw: &Value) -> Option<Match> {
    let id = id_string(&raw["id"])?;
    let teams = raw["teams"].as_array()?;
    let home_name = teams.first()?.as_str()?;
    let away_name = teams.get(1)?.as_str()?;

    let mut extras = Map::new();
    if let Some(match_type) = raw["matchType"].as_str() {
        extras.insert("match_type".into(), json!(match_type));
    }
    if let Some(series_id) = raw["series_id"].as_str() {
        extras.insert("series_id".into(), json!(series_id));
    }
    if let Some(innings) = raw["score"].as_array() {
        extras.insert("innings".into(), json!(innings));
    }

    Some(Match {
        id,
        sport: Sport::Cricket,
        league: League {
            id: raw["series_id"].as_str().unwrap_or("").to_string(),
            name: raw["name"].as_str().unwrap_or("").to_string(),
            country: None,
        },
        home: build_team(raw, home_name),
        away: build_team(raw, away_name),
        fixture: Fixture {
            start_time: raw["dateTimeGMT"]
                .as_str()
                .or_else(|| raw["date"].as_str())
                .and_then(parse_datetime),
            venue: raw["venue"].as_str().map(str::to_string),
            status: status_from(raw),
            elapsed: None,
        },
        score: reconcile_score(raw, home_name, away_name),
        extras,
    })
}

/// Normalize a series record: date range plus per-format match counts.
pub fn normalize_series(raw: &Value) -> Option<Series> {
    let id = id_string(&raw["id"])?;
    let name = raw["name"].as_str()?.to_string();

    let mut match_counts = Map::new();
    for format in ["test", "odi", "t20", "matches"] {
        if let Some(count) = int_field(&raw[format]) {
            match_counts.insert(format.to_string(), json!(count));
        }
    }

    Some(Series {
        id,
        name,
        sport: Sport::Cricket,
        status: raw["status"].as_str().map(str::to_string),
        start_date: raw["startDate"].as_str().and_then(parse_datetime),
        end_date: raw["endDate"].as_str().and_then(parse_datetime),
        match_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_full_score_string() {
        let s = parse_score_string("287/4 (48.3)");
        assert_eq!(s.runs, Some(287));
        assert_eq!(s.wickets, Some(4));
        assert_relative_eq!(s.overs.unwrap(), 48.3);
    }

    #[test]
    fn test_parse_runs_only() {
        assert_eq!(
            parse_score_string("150"),
            ParsedScore {
                runs: Some(150),
                wickets: None,
                overs: None
            }
        );
    }

    #[test]
    fn test_parse_empty_and_garbage() {
        assert_eq!(parse_score_string(""), ParsedScore::default());
        assert_eq!(parse_score_string("rain stopped play"), ParsedScore::default());
        assert_eq!(parse_score_string("287/"), ParsedScore::default());
    }

    #[test]
    fn test_parse_whole_overs() {
        let s = parse_score_string("312/7 (50)");
        assert_eq!(s.runs, Some(312));
        assert_eq!(s.wickets, Some(7));
        assert_relative_eq!(s.overs.unwrap(), 50.0);
    }

    fn sample_match() -> Value {
        json!({
            "id": "c-1001",
            "name": "India vs Australia, 3rd ODI",
            "matchType": "odi",
            "status": "Live",
            "venue": "Wankhede Stadium, Mumbai",
            "dateTimeGMT": "2024-03-01T09:00:00",
            "teams": ["India", "Australia"],
            "teamInfo": [
                {"name": "India", "shortname": "IND", "img": "https://img/ind.png"},
                {"name": "Australia", "shortname": "AUS", "img": "https://img/aus.png"}
            ],
            "score": [
                {"r": 287, "w": 4, "o": 48.3, "inning": "India Inning 1"}
            ],
            "series_id": "s-77",
            "matchStarted": true,
            "matchEnded": false
        })
    }

    #[test]
    fn test_normalize_live_match() {
        let m = normalize_match(&sample_match()).unwrap();
        assert_eq!(m.id, "c-1001");
        assert_eq!(m.sport, Sport::Cricket);
        assert_eq!(m.home.short_name, "IND");
        assert_eq!(m.away.name, "Australia");
        assert_eq!(m.fixture.status, MatchStatus::Live);
        assert_eq!(m.score.home, Some(287));
        assert_eq!(m.score.away, None, "Australia has not batted yet");
        assert_eq!(m.score.detail.as_deref(), Some("287/4 (48.3)"));
        assert_eq!(m.extras["match_type"], json!("odi"));
    }

    #[test]
    fn test_result_text_with_ended_flag_is_finished() {
        let mut raw = sample_match();
        raw["status"] = json!("Australia won by 5 wickets");
        raw["matchEnded"] = json!(true);
        let m = normalize_match(&raw).unwrap();
        assert_eq!(m.fixture.status, MatchStatus::Finished);
    }

    #[test]
    fn test_unknown_status_without_flags_maps_to_ns() {
        let raw = json!({
            "id": "c-2",
            "teams": ["A", "B"],
            "status": "something entirely new"
        });
        let m = normalize_match(&raw).unwrap();
        assert_eq!(m.fixture.status, MatchStatus::NotStarted);
    }

    #[test]
    fn test_abandoned_and_walkover_statuses() {
        let mut raw = sample_match();
        raw["status"] = json!("Match abandoned");
        assert_eq!(
            normalize_match(&raw).unwrap().fixture.status,
            MatchStatus::Abandoned
        );
        raw["status"] = json!("Walkover");
        assert_eq!(
            normalize_match(&raw).unwrap().fixture.status,
            MatchStatus::Walkover
        );
    }

    #[test]
    fn test_missing_team_info_derives_short_names() {
        let raw = json!({
            "id": "c-3",
            "teams": ["Western Province", "Boland"],
            "status": "Match not started"
        });
        let m = normalize_match(&raw).unwrap();
        assert_eq!(m.home.short_name, "WP");
        assert_eq!(m.away.short_name, "BOL");
        assert!(m.home.logo.is_none());
    }

    #[test]
    fn test_two_innings_totals_are_summed() {
        let mut raw = sample_match();
        raw["score"] = json!([
            {"r": 250, "w": 10, "o": 85.2, "inning": "India Inning 1"},
            {"r": 300, "w": 10, "o": 90.0, "inning": "Australia Inning 1"},
            {"r": 180, "w": 3, "o": 40.0, "inning": "India Inning 2"}
        ]);
        let m = normalize_match(&raw).unwrap();
        assert_eq!(m.score.home, Some(430));
        assert_eq!(m.score.away, Some(300));
        assert_eq!(m.score.detail.as_deref(), Some("180/3 (40)"));
    }

    #[test]
    fn test_string_innings_are_parsed_for_detail() {
        let mut raw = sample_match();
        raw["score"] = json!(["250/8 (50)", "251/3 (42.1)"]);
        let m = normalize_match(&raw).unwrap();
        assert_eq!(m.score.detail.as_deref(), Some("251/3 (42.1)"));
        // Bare strings carry no team attribution, so no headline totals.
        assert_eq!(m.score.home, None);
        assert_eq!(m.score.away, None);
    }

    #[test]
    fn test_normalize_series() {
        let raw = json!({
            "id": "s-77",
            "name": "Border-Gavaskar Trophy 2024",
            "startDate": "2024-02-01",
            "endDate": "2024-03-15",
            "test": 5, "odi": 0, "t20": 0, "matches": 5
        });
        let s = normalize_series(&raw).unwrap();
        assert_eq!(s.sport, Sport::Cricket);
        assert!(s.start_date.is_some());
        assert_eq!(s.match_counts["test"], json!(5));
    }

    #[test]
    fn test_normalize_series_garbage() {
        assert!(normalize_series(&json!({"name": "no id"})).is_none());
        assert!(normalize_series(&json!(17)).is_none());
    }
}
