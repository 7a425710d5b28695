use crate::profiles::{FormResult, TeamProfile};

const BASE_WEIGHT: f64 = 0.7;
const FORM_WEIGHT: f64 = 0.3;
const STRENGTH_MIN: f64 = 0.1;
const STRENGTH_MAX: f64 = 0.95;

/// Points-per-game over the recent results, scaled to [0, 1]. An empty record is treated as even.
pub fn form_score(form: &[FormResult]) -> f64 {
    if form.is_empty() {
        return 0.5;
    }
    let points: f64 = form.iter().map(|r| r.points()).sum();
    points / form.len() as f64
}

/// Blend of rating and recent form, plus the venue bonus for the home side.
pub fn team_strength(team: &TeamProfile, is_home: bool) -> f64 {
    let venue = if is_home { team.home_advantage } else { 0.0 };
    let weighted =
        team.base_strength * BASE_WEIGHT + form_score(&team.recent_form) * FORM_WEIGHT + venue;
    if weighted.is_finite() {
        weighted.clamp(STRENGTH_MIN, STRENGTH_MAX)
    } else {
        STRENGTH_MIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::FORM_LEN;
    use assert_float_eq::*;

    fn profile(base: f64, home_adv: f64, form: [FormResult; FORM_LEN]) -> TeamProfile {
        TeamProfile {
            name: "T".to_string(),
            aliases: Vec::new(),
            base_strength: base,
            home_advantage: home_adv,
            goals_for: 1.0,
            goals_against: 1.0,
            recent_form: form,
        }
    }

    #[test]
    fn form_score_weights_draws_half() {
        use FormResult::*;
        assert_float_absolute_eq!(0.9, form_score(&[Win, Win, Draw, Win, Win]), 1e-9);
        assert_float_absolute_eq!(0.7, form_score(&[Win, Draw, Win, Win, Loss]), 1e-9);
        assert_float_absolute_eq!(0.5, form_score(&[]), 1e-9);
    }

    #[test]
    fn away_side_gets_no_venue_bonus() {
        let t = profile(0.82, 0.10, [FormResult::Win, FormResult::Draw, FormResult::Win, FormResult::Win, FormResult::Loss]);
        assert_float_absolute_eq!(0.784, team_strength(&t, false), 1e-9);
        assert_float_absolute_eq!(0.884, team_strength(&t, true), 1e-9);
    }

    #[test]
    fn clamped_at_extremes() {
        let best = profile(1.0, 1.0, [FormResult::Win; FORM_LEN]);
        let worst = profile(0.0, 0.0, [FormResult::Loss; FORM_LEN]);
        for home in [true, false] {
            let hi = team_strength(&best, home);
            let lo = team_strength(&worst, home);
            assert!((STRENGTH_MIN..=STRENGTH_MAX).contains(&hi));
            assert!((STRENGTH_MIN..=STRENGTH_MAX).contains(&lo));
        }
        assert_float_absolute_eq!(0.95, team_strength(&best, true), 1e-9);
        assert_float_absolute_eq!(0.1, team_strength(&worst, false), 1e-9);
        assert_float_absolute_eq!(0.3, team_strength(&profile(0.0, 0.0, [FormResult::Win; FORM_LEN]), false), 1e-9);
    }
}
