use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LoadTestError {
    #[error("Invalid host '{0}': expected an http:// or https:// URL")]
    InvalidHost(String),

    #[error("Invalid wait range: min {min}s must be >= 0 and <= max {max}s")]
    InvalidWaitRange { min: f64, max: f64 },

    #[error("Invalid spawn rate {0}: must be a positive number")]
    InvalidSpawnRate(f64),

    #[error("At least one user is required")]
    NoUsers,

    #[error("Got {given} weights for {expected} tasks")]
    WeightCountMismatch { given: usize, expected: usize },

    #[error("At least one task weight must be greater than zero")]
    AllWeightsZero,
}
