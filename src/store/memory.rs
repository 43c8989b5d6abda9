//! In-memory submission backend (non-persistent).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{StoreOperation, SubmissionStore};
use crate::core::time::now_utc;
use crate::domain::models::{
    AssignmentDescriptor, AttachedFile, Grade, SubmissionRecord, SubmissionWrite,
};
use crate::domain::types::SubmissionState;
use crate::errors::SubmissionError;

#[derive(Clone, Default)]
pub struct InMemorySubmissionStore {
    inner: Arc<Mutex<Backend>>,
}

#[derive(Default)]
struct Backend {
    assignments: HashMap<String, AssignmentDescriptor>,
    submissions: HashMap<String, SubmissionRecord>,
    faults: HashMap<StoreOperation, VecDeque<Fault>>,
    calls: HashMap<StoreOperation, usize>,
    latency: Option<Duration>,
}

struct Fault {
    error: SubmissionError,
    after_apply: bool,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_assignment(&self, assignment: AssignmentDescriptor) {
        self.inner.lock().await.assignments.insert(assignment.id.clone(), assignment);
    }

    /// Stores a record as-is, assigning an id when it has none.
    pub async fn insert_submission(&self, mut record: SubmissionRecord) -> SubmissionRecord {
        let id = record.id.get_or_insert_with(|| Uuid::new_v4().to_string()).clone();
        self.inner.lock().await.submissions.insert(id, record.clone());
        record
    }

    pub async fn submission(&self, submission_id: &str) -> Option<SubmissionRecord> {
        self.inner.lock().await.submissions.get(submission_id).cloned()
    }

    /// Delays every subsequent call before it reaches the backend.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.inner.lock().await.latency = latency;
    }

    /// The next call of `operation` fails with `error` without touching stored data.
    pub async fn inject_fault(&self, operation: StoreOperation, error: SubmissionError) {
        self.push_fault(operation, Fault { error, after_apply: false }).await;
    }

    /// The next call of `operation` is applied, but the caller receives `error`, as when
    /// a response is lost after the server committed.
    pub async fn inject_fault_after_apply(
        &self,
        operation: StoreOperation,
        error: SubmissionError,
    ) {
        self.push_fault(operation, Fault { error, after_apply: true }).await;
    }

    pub async fn call_count(&self, operation: StoreOperation) -> usize {
        self.inner.lock().await.calls.get(&operation).copied().unwrap_or(0)
    }

    pub async fn write_count(&self) -> usize {
        let backend = self.inner.lock().await;
        backend.calls.iter().filter(|(op, _)| op.is_write()).map(|(_, count)| count).sum()
    }

    /// Evaluator-side grading of a sent submission.
    pub async fn grade(
        &self,
        submission_id: &str,
        grade: Grade,
        teacher_comment: Option<String>,
    ) -> Result<SubmissionRecord, SubmissionError> {
        let mut backend = self.inner.lock().await;
        let record = backend
            .submissions
            .get_mut(submission_id)
            .ok_or_else(|| SubmissionError::NotFound(format!("submission {submission_id}")))?;
        if !record.state.is_sent() {
            return Err(SubmissionError::invalid_state(format!(
                "cannot grade a {} submission",
                record.state.as_str()
            )));
        }
        record.state = SubmissionState::Graded;
        record.grade = Some(grade);
        record.teacher_comment = teacher_comment;
        Ok(record.clone())
    }

    async fn push_fault(&self, operation: StoreOperation, fault: Fault) {
        self.inner.lock().await.faults.entry(operation).or_default().push_back(fault);
    }

    async fn call<T: Send>(
        &self,
        operation: StoreOperation,
        apply: impl FnOnce(&mut Backend) -> Result<T, SubmissionError> + Send,
    ) -> Result<T, SubmissionError> {
        let latency = {
            let mut backend = self.inner.lock().await;
            *backend.calls.entry(operation).or_default() += 1;
            backend.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut backend = self.inner.lock().await;
        match backend.faults.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(Fault { error, after_apply: false }) => Err(error),
            Some(Fault { error, after_apply: true }) => {
                if let Err(err) = apply(&mut *backend) {
                    tracing::debug!(error = %err, "Faulted call was rejected by the backend");
                }
                Err(error)
            }
            None => apply(&mut *backend),
        }
    }
}

impl Backend {
    fn open_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<&AssignmentDescriptor, SubmissionError> {
        let assignment = self
            .assignments
            .get(assignment_id)
            .ok_or_else(|| SubmissionError::NotFound(format!("assignment {assignment_id}")))?;
        if !assignment.is_published() {
            return Err(conflict("Assignment is closed"));
        }
        Ok(assignment)
    }

    fn draft_mut(
        &mut self,
        submission_id: &str,
    ) -> Result<&mut SubmissionRecord, SubmissionError> {
        let record = self
            .submissions
            .get_mut(submission_id)
            .ok_or_else(|| SubmissionError::NotFound(format!("submission {submission_id}")))?;
        if record.state != SubmissionState::Draft {
            return Err(conflict("Submission is not a draft"));
        }
        Ok(record)
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn fetch_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<AssignmentDescriptor, SubmissionError> {
        self.call(StoreOperation::FetchAssignment, |backend| {
            backend
                .assignments
                .get(assignment_id)
                .cloned()
                .ok_or_else(|| SubmissionError::NotFound(format!("assignment {assignment_id}")))
        })
        .await
    }

    async fn find_submission(
        &self,
        assignment_id: &str,
        author_id: &str,
    ) -> Result<Option<SubmissionRecord>, SubmissionError> {
        self.call(StoreOperation::FindSubmission, |backend| {
            Ok(backend
                .submissions
                .values()
                .find(|record| {
                    record.assignment_id == assignment_id && record.author_id == author_id
                })
                .cloned())
        })
        .await
    }

    async fn create_submission(
        &self,
        write: &SubmissionWrite,
    ) -> Result<SubmissionRecord, SubmissionError> {
        self.call(StoreOperation::Create, |backend| {
            backend.open_assignment(&write.assignment_id)?;
            let duplicate = backend.submissions.values().any(|record| {
                record.assignment_id == write.assignment_id && record.author_id == write.author_id
            });
            if duplicate {
                return Err(conflict("Submission already exists for this assignment"));
            }

            let id = Uuid::new_v4().to_string();
            let record = SubmissionRecord {
                id: Some(id.clone()),
                text_response: write.text_response.clone(),
                link_response: write.link_response.clone(),
                attached_files: store_files(&id, &write.attached_files),
                ..SubmissionRecord::new_draft(&write.assignment_id, &write.author_id)
            };
            backend.submissions.insert(id, record.clone());
            Ok(record)
        })
        .await
    }

    async fn update_submission(
        &self,
        submission_id: &str,
        write: &SubmissionWrite,
    ) -> Result<SubmissionRecord, SubmissionError> {
        self.call(StoreOperation::Update, |backend| {
            backend.open_assignment(&write.assignment_id)?;
            let record = backend.draft_mut(submission_id)?;
            if record.assignment_id != write.assignment_id || record.author_id != write.author_id {
                return Err(conflict("Submission belongs to another assignment or author"));
            }
            record.text_response = write.text_response.clone();
            record.link_response = write.link_response.clone();
            record.attached_files = store_files(submission_id, &write.attached_files);
            Ok(record.clone())
        })
        .await
    }

    async fn submit_submission(
        &self,
        submission_id: &str,
    ) -> Result<SubmissionRecord, SubmissionError> {
        self.call(StoreOperation::Submit, |backend| {
            let assignment_id = backend
                .submissions
                .get(submission_id)
                .map(|record| record.assignment_id.clone())
                .ok_or_else(|| SubmissionError::NotFound(format!("submission {submission_id}")))?;
            let due_date = backend.open_assignment(&assignment_id)?.due_date;

            let now = now_utc();
            let record = backend.draft_mut(submission_id)?;
            record.state =
                if now <= due_date { SubmissionState::Submitted } else { SubmissionState::Late };
            record.submitted_at = Some(now);
            Ok(record.clone())
        })
        .await
    }

    async fn delete_submission(&self, submission_id: &str) -> Result<(), SubmissionError> {
        self.call(StoreOperation::Delete, |backend| {
            backend.draft_mut(submission_id)?;
            backend.submissions.remove(submission_id);
            Ok(())
        })
        .await
    }
}

fn store_files(submission_id: &str, files: &[AttachedFile]) -> Vec<AttachedFile> {
    files
        .iter()
        .map(|file| match file {
            AttachedFile::Local { display_name, .. } => AttachedFile::Remote {
                url: format!("memory://submissions/{submission_id}/{display_name}"),
                display_name: display_name.clone(),
            },
            remote => remote.clone(),
        })
        .collect()
}

fn conflict(message: &str) -> SubmissionError {
    SubmissionError::Server { status: 409, message: message.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DraftInput;
    use crate::domain::types::SubmissionType;
    use crate::test_support;

    fn write_for(assignment: &AssignmentDescriptor, draft: &DraftInput) -> SubmissionWrite {
        SubmissionWrite::from_draft(assignment, test_support::AUTHOR_ID, draft)
    }

    #[tokio::test]
    async fn rejects_second_submission_for_same_author() {
        let store = InMemorySubmissionStore::new();
        let assignment = test_support::assignment(SubmissionType::Text);
        store.insert_assignment(assignment.clone()).await;
        let write = write_for(&assignment, &DraftInput::text("first"));

        store.create_submission(&write).await.expect("create");
        let err = store.create_submission(&write).await.unwrap_err();

        assert!(matches!(err, SubmissionError::Server { status: 409, .. }));
    }

    #[tokio::test]
    async fn uploads_local_files_on_create() {
        let store = InMemorySubmissionStore::new();
        let assignment = test_support::assignment(SubmissionType::File);
        store.insert_assignment(assignment.clone()).await;
        let draft = DraftInput {
            attached_files: vec![AttachedFile::local("/tmp/lab.pdf")],
            ..DraftInput::default()
        };

        let record =
            store.create_submission(&write_for(&assignment, &draft)).await.expect("create");

        assert!(matches!(
            &record.attached_files[0],
            AttachedFile::Remote { url, .. } if url.ends_with("/lab.pdf")
        ));
    }

    #[tokio::test]
    async fn fault_after_apply_commits_change() {
        let store = InMemorySubmissionStore::new();
        let assignment = test_support::assignment(SubmissionType::Text);
        store.insert_assignment(assignment.clone()).await;
        let created = store
            .create_submission(&write_for(&assignment, &DraftInput::text("answer")))
            .await
            .expect("create");
        let id = created.id.clone().unwrap();

        store
            .inject_fault_after_apply(StoreOperation::Submit, SubmissionError::timeout("lost"))
            .await;
        let err = store.submit_submission(&id).await.unwrap_err();

        assert!(err.is_ambiguous());
        assert_eq!(store.submission(&id).await.unwrap().state, SubmissionState::Submitted);
        assert_eq!(store.call_count(StoreOperation::Submit).await, 1);
        assert_eq!(store.write_count().await, 2);
    }

    #[tokio::test]
    async fn grade_requires_sent_submission() {
        let store = InMemorySubmissionStore::new();
        let draft = store
            .insert_submission(SubmissionRecord::new_draft("assignment-1", test_support::AUTHOR_ID))
            .await;
        let id = draft.id.unwrap();

        let err = store.grade(&id, Grade::Points(8.0), None).await.unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidState(_)));
    }
}
