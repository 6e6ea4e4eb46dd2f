/// Errors surfaced by the DRBG and its collaborators.
///
/// Every variant is detected before the working state is touched, so a failed
/// call leaves `key`, `V` and the reseed counter exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrbgError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("drbg is not instantiated")]
    NotInstantiated,
    #[error("entropy input must be {expected} bytes, got {got}")]
    InvalidEntropyLength { expected: usize, got: usize },
    #[error("personalization string too long: max {max} bytes, got {got}")]
    PersonalizationTooLong { max: usize, got: usize },
    #[error("additional input too long: max {max} bytes, got {got}")]
    AdditionalInputTooLong { max: usize, got: usize },
    #[error("reseed interval exceeded, drbg must be reseeded")]
    ReseedRequired,
    #[error("entropy source failed: {0}")]
    Entropy(String),
}
