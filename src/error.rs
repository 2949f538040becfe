use serde::{Deserialize, Serialize};

/// Application-level error carried up to `main`.
///
/// The exit code is part of the error so that every layer can decide how
/// severe a failure is without knowing about process handling.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failure of one transport reduction over a bias sweep.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractError {
    /// The input (or the subset selected by a threshold) is too short.
    #[error("insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// No sample stays below the critical-current voltage threshold.
    #[error("no bias sample stays below the {threshold:e} V critical-current threshold")]
    ThresholdNotFound { threshold: f64 },

    #[error("bias has {bias} samples but voltage has {voltage}")]
    LengthMismatch { bias: usize, voltage: usize },

    #[error("non-finite sample at index {index}")]
    NonFinite { index: usize },

    /// Two consecutive bias values are equal, so dV/dI is undefined there.
    #[error("repeated bias value at index {index}")]
    DegenerateBias { index: usize },

    #[error("invalid threshold {value}: must be finite and >= 0")]
    InvalidThreshold { value: f64 },
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::new(3, format!("Extraction failed: {err}"))
    }
}
