use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Home => f.write_str("home"),
            Side::Away => f.write_str("away"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("missing {side} team name")]
    MissingTeamName { side: Side },

    #[error("missing league name")]
    MissingLeagueName,

    #[error("profile {name:?}: {field} out of range ({value})")]
    InvalidProfile {
        name: String,
        field: &'static str,
        value: f64,
    },
}
