use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;
use crate::predict::{OverUnder, PredictionResult};
use crate::profiles::normalize_name;
use crate::sampler::ScoreOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalScore {
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub date: String,
    pub home_goals: u8,
    pub away_goals: u8,
}

impl FinalScore {
    pub fn score(&self) -> ScoreOutcome {
        ScoreOutcome::new(self.home_goals, self.away_goals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub outcome_accuracy: f64,
    pub exact_score_rate: f64,
    pub over_under_accuracy: f64,
}

pub fn load_final_scores(path: &Path) -> Result<Vec<FinalScore>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read results {}", path.display()))?;
    serde_json::from_str(raw.trim()).context("invalid results json")
}

/// Scores stored predictions against final results. A prediction is paired with the result
/// for the same home and away team on the same date; results without a date pair with any
/// date. Predictions with no result are left out of every figure.
pub fn evaluate(predictions: &[PredictionResult], finals: &[FinalScore]) -> Metrics {
    let mut by_teams: HashMap<(String, String), Vec<&FinalScore>> = HashMap::new();
    for f in finals {
        by_teams
            .entry((normalize_name(&f.home_team), normalize_name(&f.away_team)))
            .or_default()
            .push(f);
    }

    let mut samples = 0usize;
    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut outcome_hits = 0usize;
    let mut exact_hits = 0usize;
    let mut ou_hits = 0usize;

    for p in predictions {
        let key = (
            normalize_name(&p.fixture.home_team),
            normalize_name(&p.fixture.away_team),
        );
        let Some(candidates) = by_teams.get(&key) else {
            continue;
        };
        let date = p.fixture.date.trim();
        let Some(actual) = candidates
            .iter()
            .find(|f| f.date.trim() == date)
            .or_else(|| candidates.iter().find(|f| f.date.trim().is_empty()))
        else {
            continue;
        };

        let actual_score = actual.score();
        let outcome = actual_score.outcome();
        let (h, d, a) = fractions(p);
        let (yh, yd, ya) = one_hot(outcome);
        brier_sum += (h - yh).powi(2) + (d - yd).powi(2) + (a - ya).powi(2);

        let actual_prob = match outcome {
            Outcome::Home => h,
            Outcome::Draw => d,
            Outcome::Away => a,
        }
        .clamp(1e-12, 1.0);
        log_loss_sum += -actual_prob.ln();

        if p.probabilities.leader() == outcome {
            outcome_hits += 1;
        }
        if p.likely_score == actual_score {
            exact_hits += 1;
        }
        let went_over = actual_score.total() > 2;
        if went_over == (p.over_under == OverUnder::Over) {
            ou_hits += 1;
        }
        samples += 1;
    }

    if samples == 0 {
        return Metrics::default();
    }
    let n = samples as f64;
    Metrics {
        samples,
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        outcome_accuracy: outcome_hits as f64 / n,
        exact_score_rate: exact_hits as f64 / n,
        over_under_accuracy: ou_hits as f64 / n,
    }
}

fn fractions(p: &PredictionResult) -> (f64, f64, f64) {
    let probs = &p.probabilities;
    (
        probs.home_win as f64 / 100.0,
        probs.draw as f64 / 100.0,
        probs.away_win as f64 / 100.0,
    )
}

fn one_hot(outcome: Outcome) -> (f64, f64, f64) {
    match outcome {
        Outcome::Home => (1.0, 0.0, 0.0),
        Outcome::Draw => (0.0, 1.0, 0.0),
        Outcome::Away => (0.0, 0.0, 1.0),
    }
}
