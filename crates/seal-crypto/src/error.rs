use crate::kind::HashKind;

/// Errors from hash selection and digest parsing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    /// The mnemonic does not name a supported algorithm.
    #[error("unrecognized hash algorithm: `{0}`")]
    UnknownAlgorithm(String),

    /// The digest text is not valid hex.
    #[error("invalid hex digest: {0}")]
    InvalidHex(String),

    /// The digest has the wrong size for its algorithm.
    #[error("invalid {kind} digest length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        kind: HashKind,
        expected: usize,
        actual: usize,
    },
}

/// Result alias for hash operations.
pub type HashResult<T> = Result<T, HashError>;
