use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PredictError;

pub const FORM_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl FormResult {
    pub fn points(self) -> f64 {
        match self {
            FormResult::Win => 1.0,
            FormResult::Draw => 0.5,
            FormResult::Loss => 0.0,
        }
    }

    pub fn letter(self) -> char {
        match self {
            FormResult::Win => 'W',
            FormResult::Draw => 'D',
            FormResult::Loss => 'L',
        }
    }
}

pub fn form_string(form: &[FormResult]) -> String {
    form.iter().map(|r| r.letter()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProfile {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub base_strength: f64,
    pub home_advantage: f64,
    pub goals_for: f64,
    pub goals_against: f64,
    pub recent_form: [FormResult; FORM_LEN],
}

impl TeamProfile {
    /// League-average side with an even record, used for any team missing from the tables.
    pub fn fallback() -> Self {
        Self {
            name: "default".to_string(),
            aliases: Vec::new(),
            base_strength: 0.5,
            home_advantage: 0.10,
            goals_for: 1.3,
            goals_against: 1.3,
            recent_form: [FormResult::Draw; FORM_LEN],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueProfile {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub strength_multiplier: f64,
    pub average_goals_per_match: f64,
    pub home_advantage_factor: f64,
}

impl LeagueProfile {
    pub fn fallback() -> Self {
        Self {
            name: "default".to_string(),
            aliases: Vec::new(),
            strength_multiplier: 1.0,
            average_goals_per_match: 2.60,
            home_advantage_factor: 0.10,
        }
    }
}

/// Common surface of the two lookup tables.
pub trait Profile: Clone {
    fn name(&self) -> &str;
    fn aliases(&self) -> &[String];
    fn validate(&self) -> Result<(), PredictError>;
}

impl Profile for TeamProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn validate(&self) -> Result<(), PredictError> {
        check_range(&self.name, "baseStrength", self.base_strength, 0.0, 1.0)?;
        check_range(&self.name, "homeAdvantage", self.home_advantage, 0.0, 1.0)?;
        check_range(&self.name, "goalsFor", self.goals_for, 0.0, f64::MAX)?;
        check_range(&self.name, "goalsAgainst", self.goals_against, 0.0, f64::MAX)
    }
}

impl Profile for LeagueProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn validate(&self) -> Result<(), PredictError> {
        check_positive(&self.name, "strengthMultiplier", self.strength_multiplier)?;
        check_positive(&self.name, "averageGoalsPerMatch", self.average_goals_per_match)?;
        check_range(
            &self.name,
            "homeAdvantageFactor",
            self.home_advantage_factor,
            0.0,
            1.0,
        )
    }
}

fn check_range(name: &str, field: &'static str, value: f64, lo: f64, hi: f64) -> Result<(), PredictError> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(PredictError::InvalidProfile {
            name: name.to_string(),
            field,
            value,
        })
    }
}

fn check_positive(name: &str, field: &'static str, value: f64) -> Result<(), PredictError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PredictError::InvalidProfile {
            name: name.to_string(),
            field,
            value,
        })
    }
}

/// Lookup key: trimmed, lowercased, internal whitespace collapsed to single spaces.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outcome of a table lookup. `fallback` is set when the default profile stood in.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a, T> {
    pub profile: &'a T,
    pub fallback: bool,
}

#[derive(Debug, Clone)]
struct Table<T: Profile> {
    rows: Vec<T>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    fallback: T,
}

impl<T: Profile> Table<T> {
    fn new(fallback: T) -> Self {
        Self {
            rows: Vec::new(),
            by_name: HashMap::new(),
            by_alias: HashMap::new(),
            fallback,
        }
    }

    fn insert(&mut self, row: T) {
        let key = normalize_name(row.name());
        let idx = match self.by_name.get(&key) {
            Some(&idx) => {
                self.rows[idx] = row;
                idx
            }
            None => {
                self.rows.push(row);
                let idx = self.rows.len() - 1;
                self.by_name.insert(key, idx);
                idx
            }
        };
        for alias in self.rows[idx].aliases().to_vec() {
            self.by_alias.insert(normalize_name(&alias), idx);
        }
    }

    fn lookup(&self, name: &str) -> Resolved<'_, T> {
        let key = normalize_name(name);
        let idx = self
            .by_name
            .get(&key)
            .or_else(|| self.by_alias.get(&key))
            .copied();
        match idx {
            Some(idx) => Resolved {
                profile: &self.rows[idx],
                fallback: false,
            },
            None => Resolved {
                profile: &self.fallback,
                fallback: true,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    teams: Vec<TeamProfile>,
    #[serde(default)]
    leagues: Vec<LeagueProfile>,
}

/// Read-only team and league tables. Built once, then shared by reference.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    teams: Table<TeamProfile>,
    leagues: Table<LeagueProfile>,
}

static BUILTIN: Lazy<ProfileStore> = Lazy::new(ProfileStore::from_builtin_tables);

impl ProfileStore {
    pub fn empty() -> Self {
        Self {
            teams: Table::new(TeamProfile::fallback()),
            leagues: Table::new(LeagueProfile::fallback()),
        }
    }

    pub fn builtin() -> &'static ProfileStore {
        &BUILTIN
    }

    /// Built-in tables with the rows of a JSON profile file laid over them.
    pub fn with_overrides(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read profile file {}", path.display()))?;
        let mut store = BUILTIN.clone();
        store
            .merge_json(&raw)
            .with_context(|| format!("load profile file {}", path.display()))?;
        Ok(store)
    }

    pub fn merge_json(&mut self, raw: &str) -> Result<()> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(());
        }
        let file: ProfileFile = serde_json::from_str(trimmed).context("invalid profile json")?;
        // All or nothing: a bad row leaves the store as it was.
        let mut next = self.clone();
        for team in file.teams {
            next.insert_team(team)?;
        }
        for league in file.leagues {
            next.insert_league(league)?;
        }
        *self = next;
        Ok(())
    }

    pub fn insert_team(&mut self, team: TeamProfile) -> Result<(), PredictError> {
        if team.name.trim().is_empty() {
            warn!("skipping team profile with blank name");
            return Ok(());
        }
        team.validate()?;
        self.teams.insert(team);
        Ok(())
    }

    pub fn insert_league(&mut self, league: LeagueProfile) -> Result<(), PredictError> {
        if league.name.trim().is_empty() {
            warn!("skipping league profile with blank name");
            return Ok(());
        }
        league.validate()?;
        self.leagues.insert(league);
        Ok(())
    }

    pub fn team(&self, name: &str) -> Resolved<'_, TeamProfile> {
        self.teams.lookup(name)
    }

    pub fn league(&self, name: &str) -> Resolved<'_, LeagueProfile> {
        self.leagues.lookup(name)
    }

    pub fn teams(&self) -> &[TeamProfile] {
        &self.teams.rows
    }

    pub fn leagues(&self) -> &[LeagueProfile] {
        &self.leagues.rows
    }

    fn from_builtin_tables() -> Self {
        let mut store = Self::empty();
        for row in TEAM_ROWS {
            store.teams.insert(TeamProfile {
                name: row.name.to_string(),
                aliases: row.aliases.iter().map(|a| a.to_string()).collect(),
                base_strength: row.base_strength,
                home_advantage: row.home_advantage,
                goals_for: row.goals_for,
                goals_against: row.goals_against,
                recent_form: row.form,
            });
        }
        for row in LEAGUE_ROWS {
            store.leagues.insert(LeagueProfile {
                name: row.name.to_string(),
                aliases: row.aliases.iter().map(|a| a.to_string()).collect(),
                strength_multiplier: row.strength_multiplier,
                average_goals_per_match: row.average_goals,
                home_advantage_factor: row.home_advantage_factor,
            });
        }
        store
    }
}

struct TeamRow {
    name: &'static str,
    aliases: &'static [&'static str],
    base_strength: f64,
    home_advantage: f64,
    goals_for: f64,
    goals_against: f64,
    form: [FormResult; FORM_LEN],
}

struct LeagueRow {
    name: &'static str,
    aliases: &'static [&'static str],
    strength_multiplier: f64,
    average_goals: f64,
    home_advantage_factor: f64,
}

use FormResult::{Draw as D, Loss as L, Win as W};

const fn team(
    name: &'static str,
    aliases: &'static [&'static str],
    base_strength: f64,
    home_advantage: f64,
    goals_for: f64,
    goals_against: f64,
    form: [FormResult; FORM_LEN],
) -> TeamRow {
    TeamRow {
        name,
        aliases,
        base_strength,
        home_advantage,
        goals_for,
        goals_against,
        form,
    }
}

#[rustfmt::skip]
const TEAM_ROWS: &[TeamRow] = &[
    // Premier League
    team("Manchester City", &["Man City", "MCI"], 0.85, 0.12, 2.4, 0.9, [W, W, D, W, W]),
    team("Liverpool", &["LIV"], 0.82, 0.10, 2.2, 1.0, [W, D, W, W, L]),
    team("Arsenal", &["ARS"], 0.83, 0.11, 2.1, 0.8, [W, W, W, D, W]),
    team("Chelsea", &["CHE"], 0.74, 0.09, 1.8, 1.2, [W, L, D, W, D]),
    team("Manchester United", &["Man United", "Man Utd", "MUN"], 0.70, 0.10, 1.5, 1.3, [L, W, D, L, W]),
    team("Tottenham Hotspur", &["Tottenham", "Spurs", "TOT"], 0.72, 0.09, 1.9, 1.4, [W, L, W, L, D]),
    team("Newcastle United", &["Newcastle", "NEW"], 0.73, 0.11, 1.8, 1.1, [D, W, W, L, W]),
    team("Aston Villa", &["Villa", "AVL"], 0.71, 0.10, 1.7, 1.3, [W, D, L, W, W]),
    // La Liga
    team("Real Madrid", &["RMA"], 0.87, 0.11, 2.3, 0.9, [W, W, W, D, W]),
    team("Barcelona", &["FC Barcelona", "Barca", "BAR"], 0.84, 0.10, 2.4, 1.0, [W, W, L, W, W]),
    team("Atletico Madrid", &["Atletico", "Atlético Madrid", "ATM"], 0.79, 0.12, 1.7, 0.8, [D, W, W, D, W]),
    team("Sevilla", &["SEV"], 0.66, 0.10, 1.3, 1.3, [L, D, W, D, L]),
    // Bundesliga
    team("Bayern Munich", &["Bayern", "Bayern München", "FC Bayern", "BAY"], 0.86, 0.10, 2.6, 0.9, [W, W, W, W, D]),
    team("Borussia Dortmund", &["Dortmund", "BVB"], 0.77, 0.12, 2.0, 1.3, [W, L, W, D, W]),
    team("Bayer Leverkusen", &["Leverkusen", "B04"], 0.80, 0.10, 2.1, 0.9, [W, D, W, W, W]),
    team("RB Leipzig", &["Leipzig", "RBL"], 0.75, 0.09, 1.9, 1.1, [D, W, L, W, W]),
    // Serie A
    team("Inter", &["Inter Milan", "Internazionale", "INT"], 0.81, 0.10, 2.1, 0.8, [W, W, D, W, W]),
    team("Juventus", &["Juve", "JUV"], 0.77, 0.10, 1.6, 0.8, [D, W, D, W, D]),
    team("AC Milan", &["Milan", "MIL"], 0.76, 0.10, 1.8, 1.1, [W, L, W, W, D]),
    team("Napoli", &["NAP"], 0.78, 0.11, 1.8, 0.9, [W, W, D, L, W]),
    // Ligue 1
    team("Paris Saint-Germain", &["PSG", "Paris SG"], 0.84, 0.10, 2.4, 0.9, [W, W, W, D, W]),
    team("Marseille", &["Olympique de Marseille", "OM"], 0.70, 0.12, 1.8, 1.2, [W, D, L, W, W]),
    team("Monaco", &["AS Monaco", "MON"], 0.71, 0.09, 1.9, 1.3, [L, W, W, D, W]),
];

#[rustfmt::skip]
const LEAGUE_ROWS: &[LeagueRow] = &[
    LeagueRow { name: "Premier League", aliases: &["EPL", "English Premier League"], strength_multiplier: 1.20, average_goals: 2.8, home_advantage_factor: 0.12 },
    LeagueRow { name: "La Liga", aliases: &["LaLiga", "Primera Division"], strength_multiplier: 1.15, average_goals: 2.6, home_advantage_factor: 0.10 },
    LeagueRow { name: "Bundesliga", aliases: &["1. Bundesliga"], strength_multiplier: 1.10, average_goals: 3.1, home_advantage_factor: 0.10 },
    LeagueRow { name: "Serie A", aliases: &[], strength_multiplier: 1.10, average_goals: 2.6, home_advantage_factor: 0.11 },
    LeagueRow { name: "Ligue 1", aliases: &[], strength_multiplier: 1.00, average_goals: 2.7, home_advantage_factor: 0.10 },
    LeagueRow { name: "UEFA Champions League", aliases: &["Champions League", "UCL"], strength_multiplier: 1.30, average_goals: 2.9, home_advantage_factor: 0.08 },
    LeagueRow { name: "UEFA Europa League", aliases: &["Europa League", "UEL"], strength_multiplier: 1.10, average_goals: 2.8, home_advantage_factor: 0.09 },
    LeagueRow { name: "Eredivisie", aliases: &[], strength_multiplier: 0.95, average_goals: 3.2, home_advantage_factor: 0.12 },
    LeagueRow { name: "Major League Soccer", aliases: &["MLS"], strength_multiplier: 0.85, average_goals: 2.9, home_advantage_factor: 0.13 },
];
