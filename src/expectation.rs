use serde::{Deserialize, Serialize};

use crate::profiles::{LeagueProfile, TeamProfile};

const ATTACK_WEIGHT: f64 = 0.6;
const DEFENCE_WEIGHT: f64 = 0.4;

pub const HOME_GOALS_MIN: f64 = 0.3;
pub const HOME_GOALS_MAX: f64 = 4.0;
pub const AWAY_GOALS_MIN: f64 = 0.2;
pub const AWAY_GOALS_MAX: f64 = 3.5;

/// Poisson means for each side's full-time goal count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalExpectation {
    pub home: f64,
    pub away: f64,
}

impl GoalExpectation {
    pub fn from_profiles(home: &TeamProfile, away: &TeamProfile, league: &LeagueProfile) -> Self {
        let mult = league.strength_multiplier;
        let ha = league.home_advantage_factor;

        let mut lambda_home =
            (home.goals_for * ATTACK_WEIGHT + away.goals_against * DEFENCE_WEIGHT) * mult;
        let mut lambda_away =
            (away.goals_for * DEFENCE_WEIGHT + home.goals_against * ATTACK_WEIGHT) * mult;

        lambda_home *= 1.0 + ha;
        lambda_away *= 1.0 - ha * 0.5;

        Self {
            home: clamp_finite(lambda_home, HOME_GOALS_MIN, HOME_GOALS_MAX),
            away: clamp_finite(lambda_away, AWAY_GOALS_MIN, AWAY_GOALS_MAX),
        }
    }

    pub fn total(&self) -> f64 {
        self.home + self.away
    }
}

fn clamp_finite(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() { lo } else { v.clamp(lo, hi) }
}
