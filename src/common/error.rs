//! Error handling primitives shared across the core.

use thiserror::Error;

/// Stable error codes surfaced in logs and HTTP payloads.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RiskCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Input failed validation (CSV cell, form label, config value, query).
    InvalidInput = 1,
    /// Requested model artefact was not available or not readable.
    ModelMissing = 2,
    /// Filesystem failure.
    Io = 3,
    /// Catch-all for bugs.
    Internal = 4,
}

impl RiskCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCode::Ok => "ok",
            RiskCode::InvalidInput => "invalid_input",
            RiskCode::ModelMissing => "model_missing",
            RiskCode::Io => "io",
            RiskCode::Internal => "internal",
        }
    }
}

/// Canonical error type for the core.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("model unavailable: {0}")]
    ModelMissing(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the crate.
pub type RiskResult<T> = Result<T, RiskError>;

impl RiskError {
    /// Validation helper.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Model missing helper.
    pub fn model_missing(msg: impl Into<String>) -> Self {
        Self::ModelMissing(msg.into())
    }

    /// Internal error helper.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Machine parsable code for this error.
    pub fn code(&self) -> RiskCode {
        match self {
            RiskError::InvalidInput(_) => RiskCode::InvalidInput,
            RiskError::ModelMissing(_) => RiskCode::ModelMissing,
            RiskError::Io(_) => RiskCode::Io,
            // Malformed CSV or artefact content is bad input, not a bug.
            RiskError::Csv(_) | RiskError::Json(_) => RiskCode::InvalidInput,
            RiskError::Internal(_) => RiskCode::Internal,
        }
    }
}
