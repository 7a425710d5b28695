use serde::{Deserialize, Serialize};

use crate::profiles::LeagueProfile;

const DRAW_PRIOR: f64 = 0.25;
const LEAGUE_ADJ_SCALE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

/// Home/draw/away percentages. The three buckets always sum to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeProbabilities {
    #[serde(rename = "homeWinProbability")]
    pub home_win: u8,
    #[serde(rename = "drawProbability")]
    pub draw: u8,
    #[serde(rename = "awayWinProbability")]
    pub away_win: u8,
}

impl OutcomeProbabilities {
    pub fn from_strengths(home_strength: f64, away_strength: f64, league: &LeagueProfile) -> Self {
        let adj = (league.strength_multiplier - 1.0) * LEAGUE_ADJ_SCALE;
        let home = home_strength * (1.0 + league.home_advantage_factor) + adj;
        let away = away_strength + adj;
        Self::from_scores(home, DRAW_PRIOR, away)
    }

    /// Normalizes three raw scores into integer percentages.
    ///
    /// Negative or non-finite scores count as zero. If nothing positive is left the
    /// distribution is uniform. Rounding uses the largest-remainder method: every bucket
    /// is floored, then the points still missing from 100 go to the buckets with the
    /// largest fractional parts, ties resolved draw first, then home, then away.
    pub fn from_scores(home: f64, draw: f64, away: f64) -> Self {
        let scores = [floor_score(home), floor_score(draw), floor_score(away)];
        let sum: f64 = scores.iter().sum();
        let shares = if sum.is_finite() && sum > f64::EPSILON {
            scores.map(|s| s / sum * 100.0)
        } else {
            [100.0 / 3.0; 3]
        };
        let [home_win, draw, away_win] = largest_remainder(shares);
        Self {
            home_win,
            draw,
            away_win,
        }
    }

    pub fn get(&self, outcome: Outcome) -> u8 {
        match outcome {
            Outcome::Home => self.home_win,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away_win,
        }
    }

    pub fn max(&self) -> u8 {
        self.home_win.max(self.draw).max(self.away_win)
    }

    pub fn min(&self) -> u8 {
        self.home_win.min(self.draw).min(self.away_win)
    }

    pub fn spread(&self) -> u8 {
        self.max() - self.min()
    }

    /// Strict favourite; any tie for the top bucket reads as a draw.
    pub fn leader(&self) -> Outcome {
        if self.home_win > self.draw && self.home_win > self.away_win {
            Outcome::Home
        } else if self.away_win > self.home_win && self.away_win > self.draw {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }

    pub fn sum(&self) -> u32 {
        self.home_win as u32 + self.draw as u32 + self.away_win as u32
    }
}

fn floor_score(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

// Shares are in [home, draw, away] order and must already sum to 100.
fn largest_remainder(shares: [f64; 3]) -> [u8; 3] {
    const TIE_ORDER: [usize; 3] = [1, 0, 2];

    let mut out = shares.map(|s| s.floor().clamp(0.0, 100.0) as u8);
    let assigned: u32 = out.iter().map(|v| *v as u32).sum();
    let mut missing = 100u32.saturating_sub(assigned);

    let mut order = TIE_ORDER;
    order.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.total_cmp(&ra)
    });
    // Each bucket can absorb at most one point from rounding; anything left is float drift.
    for idx in order {
        if missing == 0 {
            break;
        }
        out[idx] += 1;
        missing -= 1;
    }
    if missing > 0 {
        out[1] += missing as u8;
    }
    out
}
