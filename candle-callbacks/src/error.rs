//! Error types for callback evaluation and configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The monitored metric was not present in the validation metrics.
    #[error("metric `{metric}` not found in valid_metrics (available: {available:?})")]
    MissingMetric {
        metric: String,
        available: Vec<String>,
    },

    /// A metric tensor held more than one element.
    #[error("metric `{metric}` must be a scalar, got a tensor with {elements} elements")]
    NonScalarMetric { metric: String, elements: usize },

    #[error("invalid callback configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Candle(#[from] candle::Error),

    #[error("failed to parse callback config: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
