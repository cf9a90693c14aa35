//! Errors of the loan flow.
//!
//! [LoanError] is stored in [ProcessState::Failed](super::ProcessState::Failed),
//! so it is `Clone + PartialEq` and carries messages rather than source
//! errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    /// Amount outside the configured bounds.
    #[error("invalid amount")]
    InvalidAmount,

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("invalid credit rate: {0}")]
    InvalidRate(String),

    /// The request could not be encoded. Never retried.
    #[error("encoding error: {0}")]
    SerializationFailure(String),

    /// Connection failure, timeout or non-2xx status.
    #[error("request failed: {0}")]
    TransportFailure(String),

    /// The response body could not be decoded.
    #[error("decoding error: {0}")]
    DeserializationFailure(String),

    #[error("undefined error")]
    Undefined,
}

impl LoanError {
    /// Returns true if a submission failing with this error may be
    /// attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoanError::TransportFailure(_) | LoanError::DeserializationFailure(_)
        )
    }
}
