//! Error types for beacon-core.

use thiserror::Error;

/// Failures of the network engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A network needs at least an input and an output layer.
    #[error("network needs at least 2 layer sizes, got {0}")]
    TooFewLayers(usize),

    #[error("input has {actual} values, network expects {expected}")]
    InputSize { expected: usize, actual: usize },

    #[error("target has {actual} values, network produces {expected}")]
    TargetSize { expected: usize, actual: usize },

    /// Imported state lacks one of its two required halves.
    #[error("imported state is missing {0}")]
    MissingField(&'static str),

    #[error("imported {kind} for layer {layer} has {actual} values, expected {expected}")]
    ShapeMismatch {
        kind: &'static str,
        layer: usize,
        expected: usize,
        actual: usize,
    },

    #[error("imported state has {actual} {kind} layers, expected {expected}")]
    LayerCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Unified error type for configuration and state loading.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Map error: {0}")]
    Map(String),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl CoreError {
    pub fn config(message: impl Into<String>) -> Self {
        CoreError::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
