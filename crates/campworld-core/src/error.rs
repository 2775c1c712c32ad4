//! Error types for configuration and world construction.

use thiserror::Error;

/// Errors raised while parsing or validating a [`crate::config::WorldConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse world config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field}: range min {min} exceeds max {max}")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{field}: probability {value} must be between 0.0 and 1.0")]
    InvalidProbability { field: &'static str, value: f32 },
    #[error("{field}: value {value} must be positive")]
    NonPositive { field: &'static str, value: f32 },
}

/// Errors raised by [`crate::engine::WorldBuilder::build`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no terrain source was supplied")]
    MissingTerrain,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
