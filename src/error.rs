use thiserror::Error;

/// Errors returned by sketch construction, merging and the distributed estimator.
///
/// All variants describe caller or configuration mistakes; none of them are transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("number of registers {0} not a power of two")]
    InvalidConfiguration(usize),

    #[error("number of registers doesn't match: {expected} != {found}")]
    IncompatibleSketch { expected: usize, found: usize },

    #[error("number of ndv sketches {ndv} not equal to number of f1 sketches {f1}")]
    LengthMismatch { ndv: usize, f1: usize },

    #[error("no partition sketches")]
    EmptyInput,

    #[error("partition range [{low}, {high}] is outside of [0, {len})")]
    InvalidRange { low: usize, high: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
