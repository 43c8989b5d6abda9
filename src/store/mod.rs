//! Submission persistence behind the remote backend.
//!
//! - `http`: the production client for the EDUMON REST API.
//! - `memory`: an in-process backend with the same transition rules, used by tests
//!   and the offline demo.

mod http;
mod memory;

pub use http::HttpSubmissionStore;
pub use memory::InMemorySubmissionStore;

use async_trait::async_trait;

use crate::domain::models::{AssignmentDescriptor, SubmissionRecord, SubmissionWrite};
use crate::errors::SubmissionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    FetchAssignment,
    FindSubmission,
    Create,
    Update,
    Submit,
    Delete,
}

impl StoreOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchAssignment => "fetch_assignment",
            Self::FindSubmission => "find_submission",
            Self::Create => "create",
            Self::Update => "update",
            Self::Submit => "submit",
            Self::Delete => "delete",
        }
    }

    pub fn is_write(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Submit | Self::Delete)
    }
}

/// Remote collaborator that owns assignments and submissions.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn fetch_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<AssignmentDescriptor, SubmissionError>;

    /// `Ok(None)` only when the backend reports that no submission exists.
    async fn find_submission(
        &self,
        assignment_id: &str,
        author_id: &str,
    ) -> Result<Option<SubmissionRecord>, SubmissionError>;

    async fn create_submission(
        &self,
        write: &SubmissionWrite,
    ) -> Result<SubmissionRecord, SubmissionError>;

    async fn update_submission(
        &self,
        submission_id: &str,
        write: &SubmissionWrite,
    ) -> Result<SubmissionRecord, SubmissionError>;

    /// Requests the Draft to Submitted/Late transition; the backend picks which.
    async fn submit_submission(
        &self,
        submission_id: &str,
    ) -> Result<SubmissionRecord, SubmissionError>;

    async fn delete_submission(&self, submission_id: &str) -> Result<(), SubmissionError>;
}
