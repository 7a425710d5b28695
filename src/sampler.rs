use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::expectation::GoalExpectation;
use crate::outcome::{Outcome, OutcomeProbabilities};

const MAX_GOALS: u8 = 15;

pub const DEFAULT_DRAWS: usize = 18;
pub const DEFAULT_HALFTIME_RATIO: (f64, f64) = (0.4, 0.6);

/// An integer scoreline. Serializes as `"H-A"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ScoreOutcome {
    pub home: u8,
    pub away: u8,
}

impl ScoreOutcome {
    pub fn new(home: u8, away: u8) -> Self {
        Self { home, away }
    }

    pub fn total(&self) -> u32 {
        self.home as u32 + self.away as u32
    }

    pub fn outcome(&self) -> Outcome {
        if self.home > self.away {
            Outcome::Home
        } else if self.home < self.away {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }
}

impl fmt::Display for ScoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

impl FromStr for ScoreOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, a) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("score {s:?} is not in H-A form"))?;
        let home = h.trim().parse::<u8>().map_err(|e| format!("score {s:?}: {e}"))?;
        let away = a.trim().parse::<u8>().map_err(|e| format!("score {s:?}: {e}"))?;
        Ok(Self { home, away })
    }
}

impl From<ScoreOutcome> for String {
    fn from(score: ScoreOutcome) -> Self {
        score.to_string()
    }
}

impl TryFrom<String> for ScoreOutcome {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// P(X = k) for X ~ Poisson(lambda).
pub fn poisson_pmf(k: u32, lambda: f64) -> f64 {
    let lambda = lambda.max(0.0);
    let mut p = (-lambda).exp();
    for i in 1..=k {
        p *= lambda / i as f64;
    }
    p
}

/// P(X > line) for X ~ Poisson(lambda), e.g. `line = 2` for the over 2.5 market.
pub fn poisson_over(line: u32, lambda: f64) -> f64 {
    let under: f64 = (0..=line).map(|k| poisson_pmf(k, lambda)).sum();
    (1.0 - under).clamp(0.0, 1.0)
}

/// Knuth's multiplication method: multiply uniforms until the running product drops
/// to `e^-lambda`, counting the steps. Capped at `MAX_GOALS`.
pub fn sample_poisson<R: Rng + ?Sized>(lambda: f64, rng: &mut R) -> u8 {
    if !lambda.is_finite() || lambda <= 0.0 {
        return 0;
    }
    let limit = (-lambda).exp();
    let mut product = 1.0;
    let mut k = 0u8;
    loop {
        product *= rng.gen_range(0.0..1.0);
        if product <= limit || k >= MAX_GOALS {
            return k;
        }
        k += 1;
    }
}

/// Picks a likely scoreline by approximate MAP search.
///
/// Each of `draws` trials samples both goal counts from their Poisson means and scores the
/// pair by its joint mass `P(home) * P(away)`. The highest-mass pair wins, so the result
/// leans toward the mode of the score distribution rather than being a proportional draw
/// from it. Equal masses are broken by the outcome bucket the pair falls into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSampler {
    draws: usize,
    halftime_ratio: (f64, f64),
}

impl Default for ScoreSampler {
    fn default() -> Self {
        Self {
            draws: DEFAULT_DRAWS,
            halftime_ratio: DEFAULT_HALFTIME_RATIO,
        }
    }
}

impl ScoreSampler {
    pub fn new(draws: usize, halftime_ratio: (f64, f64)) -> Self {
        let lo = halftime_ratio.0.clamp(0.0, 1.0);
        let hi = halftime_ratio.1.clamp(0.0, 1.0);
        Self {
            draws: draws.max(1),
            halftime_ratio: (lo.min(hi), lo.max(hi)),
        }
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn halftime_ratio(&self) -> (f64, f64) {
        self.halftime_ratio
    }

    pub fn full_time<R: Rng + ?Sized>(
        &self,
        xg: &GoalExpectation,
        probs: &OutcomeProbabilities,
        rng: &mut R,
    ) -> ScoreOutcome {
        let mut best = ScoreOutcome::default();
        let mut best_key = (f64::NEG_INFINITY, 0u8);
        for _ in 0..self.draws {
            let score = ScoreOutcome::new(sample_poisson(xg.home, rng), sample_poisson(xg.away, rng));
            let mass =
                poisson_pmf(score.home as u32, xg.home) * poisson_pmf(score.away as u32, xg.away);
            let key = (mass, probs.get(score.outcome()));
            if key.0 > best_key.0 || (key.0 == best_key.0 && key.1 > best_key.1) {
                best = score;
                best_key = key;
            }
        }
        best
    }

    /// Scales the full-time goals by one ratio drawn from the configured range and floors.
    pub fn half_time<R: Rng + ?Sized>(&self, full_time: ScoreOutcome, rng: &mut R) -> ScoreOutcome {
        let (lo, hi) = self.halftime_ratio;
        let ratio = rng.gen_range(lo..=hi);
        let scale = |goals: u8| ((goals as f64 * ratio).floor() as u8).min(goals);
        ScoreOutcome::new(scale(full_time.home), scale(full_time.away))
    }
}
