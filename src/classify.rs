use serde::{Deserialize, Serialize};

use crate::outcome::OutcomeProbabilities;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

// Confidence reads the gap between the most and least likely buckets; risk reads only the
// favourite. They are computed independently and may disagree.
pub fn confidence(probs: &OutcomeProbabilities) -> Confidence {
    match probs.spread() {
        s if s > 30 => Confidence::High,
        s if s > 15 => Confidence::Medium,
        _ => Confidence::Low,
    }
}

pub fn risk_level(probs: &OutcomeProbabilities) -> RiskLevel {
    match probs.max() {
        m if m > 60 => RiskLevel::Low,
        m if m > 40 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs(home_win: u8, draw: u8, away_win: u8) -> OutcomeProbabilities {
        OutcomeProbabilities {
            home_win,
            draw,
            away_win,
        }
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(Confidence::Low, confidence(&probs(40, 25, 35)));
        assert_eq!(Confidence::Medium, confidence(&probs(41, 25, 34)));
        assert_eq!(Confidence::Medium, confidence(&probs(50, 20, 30)));
        assert_eq!(Confidence::High, confidence(&probs(51, 20, 29)));

        assert_eq!(RiskLevel::High, risk_level(&probs(40, 30, 30)));
        assert_eq!(RiskLevel::Medium, risk_level(&probs(41, 30, 29)));
        assert_eq!(RiskLevel::Medium, risk_level(&probs(60, 20, 20)));
        assert_eq!(RiskLevel::Low, risk_level(&probs(61, 20, 19)));
    }

    #[test]
    fn labels_can_disagree() {
        let p = probs(51, 12, 37);
        assert_eq!(Confidence::High, confidence(&p));
        assert_eq!(RiskLevel::Medium, risk_level(&p));
    }

    #[test]
    fn risk_only_falls_as_favourite_grows() {
        // Shift points from the draw into the home bucket, away held fixed.
        let mut last = RiskLevel::High;
        for home in 40..=80u8 {
            let p = probs(home, 80 - home, 20);
            let risk = risk_level(&p);
            assert!(risk <= last, "risk rose at home={home}");
            last = risk;
        }
        assert_eq!(RiskLevel::Low, last);
    }

    #[test]
    fn confidence_only_rises_with_spread() {
        let mut last = Confidence::Low;
        for home in 34..=90u8 {
            let rest = 100 - home;
            let p = probs(home, rest / 2, rest - rest / 2);
            let c = confidence(&p);
            assert!(c >= last, "confidence fell at home={home}");
            last = c;
        }
        assert_eq!(Confidence::High, last);
    }

    #[test]
    fn serialized_labels_are_uppercase() {
        assert_eq!("\"HIGH\"", serde_json::to_string(&Confidence::High).unwrap());
        assert_eq!("\"MEDIUM\"", serde_json::to_string(&RiskLevel::Medium).unwrap());
        assert_eq!("LOW", RiskLevel::Low.label());
    }
}
