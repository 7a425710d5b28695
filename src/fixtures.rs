use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use tracing::{info, warn};

use crate::http_client::get_text;
use crate::predict::MatchRequest;

/// Anything that can hand the engine a list of fixtures to predict.
pub trait FixtureSource {
    fn fixtures(&self) -> Result<Vec<MatchRequest>>;
}

#[derive(Debug, Clone)]
pub struct FileFixtureSource {
    pub path: PathBuf,
}

impl FileFixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FixtureSource for FileFixtureSource {
    fn fixtures(&self) -> Result<Vec<MatchRequest>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read fixtures {}", self.path.display()))?;
        parse_fixtures_json(&raw)
    }
}

/// api-sports style `/fixtures` endpoint.
#[derive(Debug, Clone)]
pub struct ApiFixtureSource {
    pub base_url: String,
    pub api_key: String,
    pub league_id: Option<u32>,
    pub season: Option<u16>,
    pub date: Option<String>,
}

impl ApiFixtureSource {
    pub fn url(&self) -> String {
        let mut params = Vec::new();
        if let Some(id) = self.league_id {
            params.push(format!("league={id}"));
        }
        if let Some(season) = self.season {
            params.push(format!("season={season}"));
        }
        if let Some(date) = self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            params.push(format!("date={date}"));
        }
        let base = self.base_url.trim_end_matches('/');
        if params.is_empty() {
            format!("{base}/fixtures")
        } else {
            format!("{base}/fixtures?{}", params.join("&"))
        }
    }
}

impl FixtureSource for ApiFixtureSource {
    fn fixtures(&self) -> Result<Vec<MatchRequest>> {
        if self.api_key.trim().is_empty() {
            bail!("fixture api key is not set");
        }
        let url = self.url();
        let body = get_text(&url, &[("x-apisports-key", self.api_key.as_str())])
            .context("fixtures request failed")?;
        let out = parse_fixtures_json(&body)?;
        info!("fetched {} fixtures from {url}", out.len());
        Ok(out)
    }
}

/// Accepts either an api-sports envelope (`{"response": [...]}`) or a plain array of
/// `{homeTeam, awayTeam, league, date}` objects. Entries without both team names are skipped.
pub fn parse_fixtures_json(raw: &str) -> Result<Vec<MatchRequest>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid fixtures json")?;

    if let Some(errors) = root.get("errors").filter(|e| has_content(e)) {
        bail!("fixture api reported errors: {errors}");
    }

    let (items, api_shape) = match &root {
        Value::Array(items) => (items.as_slice(), false),
        Value::Object(_) => match root.get("response").and_then(|r| r.as_array()) {
            Some(items) => (items.as_slice(), true),
            None => bail!("fixtures json has no response array"),
        },
        _ => bail!("fixtures json must be an object or array"),
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let parsed = if api_shape {
            parse_api_fixture(item)
        } else {
            parse_plain_fixture(item)
        };
        match parsed {
            Some(req) => out.push(req),
            None => warn!("skipping fixture #{i}: missing team names"),
        }
    }
    Ok(out)
}

fn parse_api_fixture(v: &Value) -> Option<MatchRequest> {
    let home = pick_str(v, &["teams", "home", "name"])?;
    let away = pick_str(v, &["teams", "away", "name"])?;
    let league = pick_str(v, &["league", "name"]).unwrap_or_default();
    let date = pick_str(v, &["fixture", "date"]).unwrap_or_default();
    build(home, away, league, date)
}

fn parse_plain_fixture(v: &Value) -> Option<MatchRequest> {
    let home = pick_str(v, &["homeTeam"])?;
    let away = pick_str(v, &["awayTeam"])?;
    let league = pick_str(v, &["league"]).unwrap_or_default();
    let date = pick_str(v, &["date"]).unwrap_or_default();
    build(home, away, league, date)
}

fn build(home: &str, away: &str, league: &str, date: &str) -> Option<MatchRequest> {
    if home.trim().is_empty() || away.trim().is_empty() {
        return None;
    }
    Some(MatchRequest::new(home, away, league, &calendar_date(date)))
}

fn pick_str<'v>(v: &'v Value, path: &[&str]) -> Option<&'v str> {
    let mut cur = v;
    for key in path {
        cur = cur.get(*key)?;
    }
    cur.as_str()
}

fn has_content(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Reduces an RFC 3339 timestamp to its `YYYY-MM-DD` date; anything else passes through trimmed.
pub fn calendar_date(raw: &str) -> String {
    let s = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return ts.date_naive().to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.to_string();
    }
    s.to_string()
}
