/// Rejection reasons when parsing an order key from external data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderKeyError {
    #[error("order key must not be empty")]
    Empty,
    #[error("invalid order key digit {ch:?} at index {index}")]
    InvalidDigit { ch: char, index: usize },
    #[error("order key {0:?} ends in the zero digit")]
    TrailingZero(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_key_len must be between 1 and {limit}, got {value}")]
    MaxKeyLen { value: usize, limit: usize },
    #[error("rebalance_key_len must be between 1 and max_key_len ({max}), got {value}")]
    RebalanceKeyLen { value: usize, max: usize },
    #[error("environment variable {name} is not a valid integer: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Failure reported by a placement persistence collaborator.
///
/// Recoverable: the local optimistic placement stays in effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("placement rejected: {0}")]
    Rejected(String),
    #[error("persistence backend unavailable: {0}")]
    Unavailable(String),
}
