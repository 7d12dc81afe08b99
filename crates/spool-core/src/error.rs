use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("invalid limit for tube {tube:?}: {value} (tube limits must be >= 1)")]
    InvalidLimit { tube: String, value: usize },
}
