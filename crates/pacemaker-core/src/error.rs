//! Error types for the pacemaker module

use thiserror::Error;

/// Invalid timing parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Start interval must be positive, got {0}")]
    NonPositiveStart(f64),

    #[error("Start interval {0} is below the time resolution")]
    StartBelowResolution(f64),

    #[error("Growth factor must exceed 1, got {0}")]
    NonGrowing(f64),

    #[error("Noise coefficient must not be negative, got {0}")]
    NegativeNoise(f64),

    #[error("Resumption delay must not be negative, got {0}")]
    NegativeDelay(f64),

    #[error("Parameter {name} is not finite")]
    NotFinite { name: &'static str },
}

/// Core pacemaker errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PacemakerError {
    // Command errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("An attempt to retrieve the chunk '{chunk}' from {buffer}; retrieving from {buffer} is not possible")]
    Unsupported { buffer: String, chunk: String },

    // Binding errors
    #[error("Variable '{0}' is not bound")]
    UnboundVariable(String),

    // Inspection errors
    #[error("Unknown inquiry: {attribute} {value}")]
    UnknownInquiry { attribute: String, value: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for pacemaker operations
pub type PacemakerResult<T> = Result<T, PacemakerError>;
