use thiserror::Error;

use crate::domain::models::SubmissionRecord;
use crate::domain::types::SubmissionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    NotFound,
    InvalidState,
    EmptyContent,
    Server,
    Decode,
    Busy,
    RefreshRequired,
    LocalFile,
}

#[derive(Debug, Clone, Error)]
pub enum SubmissionError {
    #[error("network error: {message}")]
    Network { message: String, timed_out: bool },
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("submission content is empty for {} assignment", submission_type.as_str())]
    EmptyContent { submission_type: SubmissionType },
    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },
    #[error("failed to decode server response: {0}")]
    Decode(String),
    #[error("another action is already in progress")]
    Busy,
    #[error("submission state must be refreshed before further actions")]
    RefreshRequired,
    #[error("failed to read attachment {path}: {message}")]
    LocalFile { path: String, message: String },
    /// The draft was persisted but the submit transition did not complete.
    #[error("draft saved but not submitted: {cause}")]
    SubmitNotCompleted { draft: Box<SubmissionRecord>, cause: Box<SubmissionError> },
}

impl SubmissionError {
    pub(crate) fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into(), timed_out: false }
    }

    pub(crate) fn timeout(message: impl Into<String>) -> Self {
        Self::Network { message: message.into(), timed_out: true }
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }

    /// The error kind, looking through `SubmitNotCompleted` to its cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::EmptyContent { .. } => ErrorKind::EmptyContent,
            Self::Server { .. } => ErrorKind::Server,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Busy => ErrorKind::Busy,
            Self::RefreshRequired => ErrorKind::RefreshRequired,
            Self::LocalFile { .. } => ErrorKind::LocalFile,
            Self::SubmitNotCompleted { cause, .. } => cause.kind(),
        }
    }

    /// Outcome of the server-side operation is unknown and must be re-fetched.
    pub fn is_ambiguous(&self) -> bool {
        match self {
            Self::Network { timed_out, .. } => *timed_out,
            Self::SubmitNotCompleted { cause, .. } => cause.is_ambiguous(),
            _ => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Network { timed_out: true, .. } => {
                "The server did not answer in time. Refresh to see the current state.".to_string()
            }
            Self::Network { .. } => "No connection to the server. Try again.".to_string(),
            Self::NotFound(what) => format!("The {what} could not be found."),
            Self::InvalidState(_) => "This submission can no longer be changed.".to_string(),
            Self::EmptyContent { submission_type } => match submission_type {
                SubmissionType::Text => "Write an answer before saving.".to_string(),
                SubmissionType::Link => "Add a link before saving.".to_string(),
                _ => "Attach a file or write an answer before saving.".to_string(),
            },
            Self::Server { message, .. } => format!("The server rejected the request: {message}"),
            Self::Decode(_) => "The server sent an unexpected response.".to_string(),
            Self::Busy => "Please wait for the current action to finish.".to_string(),
            Self::RefreshRequired => "Refresh the submission before continuing.".to_string(),
            Self::LocalFile { path, .. } => format!("The file {path} could not be read."),
            Self::SubmitNotCompleted { cause, .. } => {
                format!("Your draft was saved but not submitted. {}", cause.user_message())
            }
        }
    }
}
