use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Reference table, scaler or search settings are unusable. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Caller mistakes detected before any distance is computed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing target field: {0}")]
    MissingTarget(&'static str),

    #[error("Missing weight field: {0}")]
    MissingWeight(&'static str),

    #[error("Field '{field}' must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("Weight for '{0}' must not be negative")]
    NegativeWeight(&'static str),

    #[error("Weights must not all be zero")]
    ZeroTotalWeight,

    #[error("Result limit must be a positive integer")]
    InvalidLimit,
}
