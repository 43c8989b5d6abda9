//! Wire payloads exchanged with the submission backend.
//!
//! Payloads are decoded strictly: every non-nullable field must be present and the
//! result must satisfy the record invariants, otherwise decoding fails.

pub(crate) mod assignment;
pub(crate) mod submission;

use thiserror::Error;

use crate::errors::SubmissionError;

#[derive(Debug, Error)]
pub(crate) enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("field {0} must not be empty")]
    EmptyField(&'static str),
    #[error("{0}")]
    Invariant(String),
}

impl From<DecodeError> for SubmissionError {
    fn from(err: DecodeError) -> Self {
        SubmissionError::Decode(err.to_string())
    }
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), DecodeError> {
    if value.trim().is_empty() {
        return Err(DecodeError::EmptyField(field));
    }
    Ok(())
}
