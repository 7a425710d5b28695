pub mod accuracy;
pub mod classify;
pub mod config;
pub mod error;
pub mod expectation;
pub mod fixtures;
pub mod http_client;
pub mod outcome;
pub mod persist;
pub mod predict;
pub mod profiles;
pub mod sampler;
pub mod strength;

pub use error::PredictError;
pub use predict::{MatchRequest, PredictionResult, Predictor};
pub use profiles::ProfileStore;
