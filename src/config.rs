use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::profiles::ProfileStore;
use crate::sampler::{DEFAULT_DRAWS, DEFAULT_HALFTIME_RATIO, ScoreSampler};

const MIN_DRAWS: usize = 5;
const MAX_DRAWS: usize = 50;

pub const DEFAULT_API_BASE: &str = "https://v3.football.api-sports.io";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_draws: usize,
    pub halftime_ratio: (f64, f64),
    pub seed: Option<u64>,
    pub profiles_path: Option<PathBuf>,
    pub api_base: String,
    pub api_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_draws: DEFAULT_DRAWS,
            halftime_ratio: DEFAULT_HALFTIME_RATIO,
            seed: None,
            profiles_path: None,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
        }
    }
}

impl EngineConfig {
    /// Loads `.env.local` and `.env` (first one wins per key), then reads the environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let sample_draws = lookup("MATCHCAST_SAMPLE_DRAWS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(d.sample_draws)
            .clamp(MIN_DRAWS, MAX_DRAWS);
        let ht_min = lookup("MATCHCAST_HALFTIME_MIN")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(d.halftime_ratio.0)
            .clamp(0.0, 1.0);
        let ht_max = lookup("MATCHCAST_HALFTIME_MAX")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(d.halftime_ratio.1)
            .clamp(0.0, 1.0);
        let seed = lookup("MATCHCAST_SEED").and_then(|v| v.trim().parse::<u64>().ok());
        let profiles_path = lookup("MATCHCAST_PROFILES")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let api_base = lookup("MATCHCAST_API_BASE")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(d.api_base);
        let api_key = lookup("API_FOOTBALL_KEY").filter(|v| !v.trim().is_empty());

        Self {
            sample_draws,
            halftime_ratio: (ht_min.min(ht_max), ht_min.max(ht_max)),
            seed,
            profiles_path,
            api_base,
            api_key,
        }
    }

    pub fn set_sample_draws(&mut self, draws: usize) {
        self.sample_draws = draws.clamp(MIN_DRAWS, MAX_DRAWS);
    }

    pub fn sampler(&self) -> ScoreSampler {
        ScoreSampler::new(self.sample_draws, self.halftime_ratio)
    }

    /// Built-in tables, or the built-ins with the configured override file applied.
    pub fn profile_store(&self) -> Result<ProfileStore> {
        match &self.profiles_path {
            Some(path) => ProfileStore::with_overrides(path),
            None => Ok(ProfileStore::builtin().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = EngineConfig::from_lookup(|_| None);
        assert_eq!(EngineConfig::default(), cfg);
        assert_eq!(18, cfg.sampler().draws());
    }

    #[test]
    fn reads_and_clamps_values() {
        let cfg = EngineConfig::from_lookup(lookup_from(&[
            ("MATCHCAST_SAMPLE_DRAWS", "500"),
            ("MATCHCAST_HALFTIME_MIN", "0.7"),
            ("MATCHCAST_HALFTIME_MAX", "0.3"),
            ("MATCHCAST_SEED", " 42 "),
            ("MATCHCAST_API_BASE", "http://localhost:8080/"),
            ("API_FOOTBALL_KEY", ""),
        ]));
        assert_eq!(MAX_DRAWS, cfg.sample_draws);
        assert_eq!((0.3, 0.7), cfg.halftime_ratio);
        assert_eq!(Some(42), cfg.seed);
        assert_eq!("http://localhost:8080", cfg.api_base);
        assert_eq!(None, cfg.api_key);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let cfg = EngineConfig::from_lookup(lookup_from(&[
            ("MATCHCAST_SAMPLE_DRAWS", "many"),
            ("MATCHCAST_HALFTIME_MIN", "NaN"),
            ("MATCHCAST_SEED", "-1"),
        ]));
        assert_eq!(DEFAULT_DRAWS, cfg.sample_draws);
        assert_eq!(DEFAULT_HALFTIME_RATIO, cfg.halftime_ratio);
        assert_eq!(None, cfg.seed);
    }
}
