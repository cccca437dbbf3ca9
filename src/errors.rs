/// Domain-specific error types for the premium engine.
/// Validation failures are all-or-nothing: nothing is computed or cached
/// when a request is rejected.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("state corruption: {0}")]
    StateCorruption(String),
}

impl From<serde_json::Error> for PricingError {
    fn from(e: serde_json::Error) -> Self {
        PricingError::Serialization(e.to_string())
    }
}

pub type PricingResult<T> = Result<T, PricingError>;
