use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{self, Confidence, RiskLevel};
use crate::error::{PredictError, Side};
use crate::expectation::GoalExpectation;
use crate::outcome::{Outcome, OutcomeProbabilities};
use crate::profiles::{ProfileStore, Resolved, TeamProfile, form_string};
use crate::sampler::{ScoreOutcome, ScoreSampler, poisson_over};
use crate::strength::{form_score, team_strength};

const OVER_UNDER_LINE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    // Kick-off date (ISO-8601). Carried through to the result, not used by the model.
    #[serde(default)]
    pub date: String,
}

impl MatchRequest {
    pub fn new(home_team: &str, away_team: &str, league: &str, date: &str) -> Self {
        Self {
            home_team: home_team.trim().to_string(),
            away_team: away_team.trim().to_string(),
            league: league.trim().to_string(),
            date: date.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        if self.home_team.trim().is_empty() {
            return Err(PredictError::MissingTeamName { side: Side::Home });
        }
        if self.away_team.trim().is_empty() {
            return Err(PredictError::MissingTeamName { side: Side::Away });
        }
        if self.league.trim().is_empty() {
            return Err(PredictError::MissingLeagueName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverUnder {
    #[serde(rename = "Over 2.5")]
    Over,
    #[serde(rename = "Under 2.5")]
    Under,
}

impl OverUnder {
    /// "Over 2.5" only when more than three goals are the likelier side of the line.
    pub fn from_expected_total(total: f64) -> (Self, f64) {
        let p_over = poisson_over(OVER_UNDER_LINE, total);
        let call = if p_over > 0.5 {
            OverUnder::Over
        } else {
            OverUnder::Under
        };
        (call, p_over)
    }

    pub fn label(self) -> &'static str {
        match self {
            OverUnder::Over => "Over 2.5",
            OverUnder::Under => "Under 2.5",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    #[serde(rename = "match")]
    pub fixture: MatchRequest,
    #[serde(flatten)]
    pub probabilities: OutcomeProbabilities,
    pub likely_score: ScoreOutcome,
    pub halftime_result: ScoreOutcome,
    #[serde(rename = "overUnder2_5")]
    pub over_under: OverUnder,
    pub winner: String,
    pub confidence: Confidence,
    pub risk_level: RiskLevel,
    pub reasoning: String,
    pub key_factors: Vec<String>,
    pub expected_goals: GoalExpectation,
}

/// Runs the full pipeline for one fixture: strengths, expected goals, outcome split,
/// sampled score, labels and the written rationale.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    store: &'a ProfileStore,
    sampler: ScoreSampler,
}

impl<'a> Predictor<'a> {
    pub fn new(store: &'a ProfileStore, sampler: ScoreSampler) -> Self {
        Self { store, sampler }
    }

    pub fn predict<R: Rng + ?Sized>(
        &self,
        request: &MatchRequest,
        rng: &mut R,
    ) -> Result<PredictionResult, PredictError> {
        request.validate()?;

        let home = self.store.team(&request.home_team);
        let away = self.store.team(&request.away_team);
        let league = self.store.league(&request.league);
        for (requested, fallback) in [
            (&request.home_team, home.fallback),
            (&request.away_team, away.fallback),
            (&request.league, league.fallback),
        ] {
            if fallback {
                warn!("no profile for {requested:?}, using defaults");
            }
        }

        let home_strength = team_strength(home.profile, true);
        let away_strength = team_strength(away.profile, false);
        let xg = GoalExpectation::from_profiles(home.profile, away.profile, league.profile);
        let probabilities =
            OutcomeProbabilities::from_strengths(home_strength, away_strength, league.profile);

        let likely_score = self.sampler.full_time(&xg, &probabilities, rng);
        let halftime_result = self.sampler.half_time(likely_score, rng);

        let (over_under, p_over) = OverUnder::from_expected_total(xg.total());

        let confidence = classify::confidence(&probabilities);
        let risk_level = classify::risk_level(&probabilities);

        let league_name = if league.fallback {
            request.league.trim()
        } else {
            league.profile.name.as_str()
        };
        let home_name = request.home_team.trim();
        let away_name = request.away_team.trim();
        let winner = match probabilities.leader() {
            Outcome::Home => home_name.to_string(),
            Outcome::Away => away_name.to_string(),
            Outcome::Draw => "Draw".to_string(),
        };

        let narrative = Narrative {
            home_name,
            away_name,
            league_name,
            home: &home,
            away: &away,
            home_strength,
            away_strength,
            xg: &xg,
            probabilities: &probabilities,
            likely_score,
            over_under,
            p_over,
            confidence,
            risk_level,
        };
        let reasoning = narrative.reasoning();
        let mut key_factors = narrative.key_factors();
        if league.fallback {
            key_factors.push(format!(
                "No profile for {league_name}; default league parameters used"
            ));
        }

        debug!(
            "{home_name} v {away_name}: {}/{}/{} {likely_score}",
            probabilities.home_win, probabilities.draw, probabilities.away_win
        );

        Ok(PredictionResult {
            fixture: request.clone(),
            probabilities,
            likely_score,
            halftime_result,
            over_under,
            winner,
            confidence,
            risk_level,
            reasoning,
            key_factors,
            expected_goals: xg,
        })
    }

    pub fn predict_seeded(
        &self,
        request: &MatchRequest,
        seed: u64,
    ) -> Result<PredictionResult, PredictError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.predict(request, &mut rng)
    }

    /// Predicts every request in parallel. Request `i` gets its own generator seeded with
    /// `base_seed + i`, so output order and content do not depend on scheduling.
    pub fn predict_batch(
        &self,
        requests: &[MatchRequest],
        base_seed: u64,
    ) -> Vec<Result<PredictionResult, PredictError>> {
        requests
            .par_iter()
            .enumerate()
            .map(|(i, request)| self.predict_seeded(request, base_seed.wrapping_add(i as u64)))
            .collect()
    }
}

struct Narrative<'n> {
    home_name: &'n str,
    away_name: &'n str,
    league_name: &'n str,
    home: &'n Resolved<'n, TeamProfile>,
    away: &'n Resolved<'n, TeamProfile>,
    home_strength: f64,
    away_strength: f64,
    xg: &'n GoalExpectation,
    probabilities: &'n OutcomeProbabilities,
    likely_score: ScoreOutcome,
    over_under: OverUnder,
    p_over: f64,
    confidence: Confidence,
    risk_level: RiskLevel,
}

impl Narrative<'_> {
    fn reasoning(&self) -> String {
        let p = self.probabilities;
        let lean = match p.leader() {
            Outcome::Home => format!("{} are favoured at home", self.home_name),
            Outcome::Away => format!("{} are favoured on the road", self.away_name),
            Outcome::Draw => "a draw is the leading outcome".to_string(),
        };
        format!(
            "{} (form {}) host {} (form {}) in the {}. Expected goals of {:.2} to {:.2} make {} \
             the most likely score and {lean}. At {}% / {}% / {}% the call carries {} confidence \
             and {} risk.",
            self.home_name,
            form_string(&self.home.profile.recent_form),
            self.away_name,
            form_string(&self.away.profile.recent_form),
            self.league_name,
            self.xg.home,
            self.xg.away,
            self.likely_score,
            p.home_win,
            p.draw,
            p.away_win,
            self.confidence.label(),
            self.risk_level.label(),
        )
    }

    fn key_factors(&self) -> Vec<String> {
        let home = self.home.profile;
        let away = self.away.profile;
        let mut out = vec![
            format!(
                "Strength {} {:.2} vs {} {:.2}",
                self.home_name, self.home_strength, self.away_name, self.away_strength
            ),
            format!(
                "Home advantage +{:.2} for {}",
                home.home_advantage, self.home_name
            ),
            format!(
                "Form {} {} ({:.0}%), {} {} ({:.0}%)",
                self.home_name,
                form_string(&home.recent_form),
                form_score(&home.recent_form) * 100.0,
                self.away_name,
                form_string(&away.recent_form),
                form_score(&away.recent_form) * 100.0,
            ),
            format!(
                "Expected goals {:.2}-{:.2}, {} (over at {:.0}%)",
                self.xg.home,
                self.xg.away,
                self.over_under.label(),
                self.p_over * 100.0
            ),
        ];
        for (name, resolved) in [(self.home_name, self.home), (self.away_name, self.away)] {
            if resolved.fallback {
                out.push(format!("No profile for {name}; league-average defaults used"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{FormResult, LeagueProfile};

    fn request(home: &str, away: &str, league: &str) -> MatchRequest {
        MatchRequest::new(home, away, league, "2024-09-14")
    }

    fn predictor() -> Predictor<'static> {
        Predictor::new(ProfileStore::builtin(), ScoreSampler::default())
    }

    #[test]
    fn blank_names_fail_validation() {
        let p = predictor();
        assert_eq!(
            Err(PredictError::MissingTeamName { side: Side::Home }),
            p.predict_seeded(&request("  ", "Liverpool", "Premier League"), 1)
        );
        assert_eq!(
            Err(PredictError::MissingTeamName { side: Side::Away }),
            p.predict_seeded(&request("Arsenal", "", "Premier League"), 1)
        );
        assert_eq!(
            Err(PredictError::MissingLeagueName),
            p.predict_seeded(&request("Arsenal", "Chelsea", " "), 1)
        );
    }

    #[test]
    fn city_at_home_to_liverpool() {
        let result = predictor()
            .predict_seeded(&request("Manchester City", "Liverpool", "Premier League"), 9)
            .unwrap();
        let p = result.probabilities;
        assert_eq!((51, 12, 37), (p.home_win, p.draw, p.away_win));
        assert_eq!("Manchester City", result.winner);
        assert_eq!(Confidence::High, result.confidence);
        assert_eq!(RiskLevel::Medium, result.risk_level);
        assert!(result.reasoning.contains("WWDWW"));
        assert!(result.reasoning.contains("Premier League"));
        assert_eq!(4, result.key_factors.len());
    }

    #[test]
    fn unknown_team_falls_back_and_is_flagged() {
        let result = predictor()
            .predict_seeded(&request("Nonexistent FC", "Arsenal", "Premier League"), 5)
            .unwrap();
        assert_eq!(100, result.probabilities.sum());
        assert!(
            result
                .key_factors
                .iter()
                .any(|f| f.contains("No profile for Nonexistent FC"))
        );
        assert!(result.reasoning.starts_with("Nonexistent FC (form DDDDD)"));
    }

    #[test]
    fn unknown_league_keeps_requested_name() {
        let result = predictor()
            .predict_seeded(&request("Arsenal", "Chelsea", "Sunday League"), 5)
            .unwrap();
        assert!(result.reasoning.contains("in the Sunday League"));
        assert!(result.key_factors.last().unwrap().contains("Sunday League"));
    }

    #[test]
    fn same_seed_same_result() {
        let p = predictor();
        let req = request("Barcelona", "Real Madrid", "La Liga");
        assert_eq!(p.predict_seeded(&req, 77), p.predict_seeded(&req, 77));
    }

    #[test]
    fn batch_matches_sequential_seeding() {
        let p = predictor();
        let reqs = vec![
            request("Inter", "Juventus", "Serie A"),
            request("Napoli", "AC Milan", "Serie A"),
            request("", "AC Milan", "Serie A"),
            request("Bayern Munich", "Borussia Dortmund", "Bundesliga"),
        ];
        let batch = p.predict_batch(&reqs, 100);
        assert_eq!(reqs.len(), batch.len());
        for (i, (req, got)) in reqs.iter().zip(&batch).enumerate() {
            assert_eq!(&p.predict_seeded(req, 100 + i as u64), got);
        }
        assert!(batch[2].is_err());
    }

    #[test]
    fn draw_heavy_store_names_draw_as_winner() {
        let mut store = ProfileStore::empty();
        let even = TeamProfile {
            base_strength: 0.1,
            home_advantage: 0.0,
            recent_form: [FormResult::Loss; 5],
            ..TeamProfile::fallback()
        };
        store
            .insert_team(TeamProfile {
                name: "A".to_string(),
                ..even.clone()
            })
            .unwrap();
        store
            .insert_team(TeamProfile {
                name: "B".to_string(),
                ..even
            })
            .unwrap();
        store
            .insert_league(LeagueProfile {
                name: "Flat".to_string(),
                home_advantage_factor: 0.0,
                ..LeagueProfile::fallback()
            })
            .unwrap();
        let result = Predictor::new(&store, ScoreSampler::default())
            .predict_seeded(&request("A", "B", "Flat"), 1)
            .unwrap();
        // 0.1 / 0.25 / 0.1 of 0.45.
        assert_eq!(
            (22, 56, 22),
            (
                result.probabilities.home_win,
                result.probabilities.draw,
                result.probabilities.away_win
            )
        );
        assert_eq!("Draw", result.winner);
        assert_eq!(RiskLevel::Medium, result.risk_level);
    }

    fn store_scoring(goals: f64) -> ProfileStore {
        let mut store = ProfileStore::empty();
        for name in ["North", "South"] {
            store
                .insert_team(TeamProfile {
                    name: name.to_string(),
                    goals_for: goals,
                    goals_against: goals,
                    ..TeamProfile::fallback()
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn tight_teams_go_under_and_open_teams_go_over() {
        let tight = store_scoring(0.4);
        let result = Predictor::new(&tight, ScoreSampler::default())
            .predict_seeded(&request("North", "South", "Anywhere"), 9)
            .unwrap();
        // 0.44 + 0.38 expected goals.
        assert!(result.expected_goals.total() < 1.0);
        assert_eq!(OverUnder::Under, result.over_under);
        assert!(result.key_factors.iter().any(|f| f.contains("Under 2.5")));
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!("Under 2.5", v["overUnder2_5"]);

        let open = store_scoring(3.0);
        let result = Predictor::new(&open, ScoreSampler::default())
            .predict_seeded(&request("North", "South", "Anywhere"), 9)
            .unwrap();
        assert!(result.expected_goals.total() > 6.0);
        assert_eq!(OverUnder::Over, result.over_under);
        assert!(result.key_factors.iter().any(|f| f.contains("Over 2.5")));
    }

    #[test]
    fn over_under_flips_where_three_goals_become_likelier() {
        // P(X > 2) = 0.5 at lambda ~2.674.
        let (below, p_below) = OverUnder::from_expected_total(2.6);
        let (above, p_above) = OverUnder::from_expected_total(2.75);
        assert_eq!(OverUnder::Under, below);
        assert_eq!(OverUnder::Over, above);
        assert!(p_below < 0.5 && p_above > 0.5);
        assert!(poisson_over(2, 2.66) < 0.5);
        assert!(poisson_over(2, 2.69) > 0.5);
        assert_eq!(OverUnder::Under, OverUnder::from_expected_total(0.0).0);
    }

    #[test]
    fn json_uses_published_field_names() {
        let result = predictor()
            .predict_seeded(&request("Arsenal", "Chelsea", "EPL"), 3)
            .unwrap();
        let v = serde_json::to_value(&result).unwrap();
        for key in [
            "homeWinProbability",
            "drawProbability",
            "awayWinProbability",
            "likelyScore",
            "halftimeResult",
            "overUnder2_5",
            "winner",
            "confidence",
            "riskLevel",
            "reasoning",
            "keyFactors",
        ] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert_eq!("Arsenal", v["match"]["homeTeam"]);
        assert!(v["likelyScore"].as_str().unwrap().contains('-'));
        let ou = v["overUnder2_5"].as_str().unwrap();
        assert!(ou == "Over 2.5" || ou == "Under 2.5");

        let back: PredictionResult = serde_json::from_value(v).unwrap();
        assert_eq!(result.probabilities, back.probabilities);
        assert_eq!(result.likely_score, back.likely_score);
        assert_eq!(result.fixture, back.fixture);
    }
}
