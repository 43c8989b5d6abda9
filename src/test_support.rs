use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use time::{Duration, OffsetDateTime};

use crate::core::time::now_utc;
use crate::domain::models::{AssignmentDescriptor, Grade, SubmissionRecord, SupportingMaterial};
use crate::domain::types::{AssignmentStatus, MaterialKind, SubmissionState, SubmissionType};
use crate::services::submission_form::SubmissionFormController;
use crate::store::InMemorySubmissionStore;

pub(crate) const AUTHOR_ID: &str = "author-1";
pub(crate) const ASSIGNMENT_ID: &str = "assignment-1";

/// Serializes tests that touch process environment variables.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A published assignment due a week from now.
pub(crate) fn assignment(submission_type: SubmissionType) -> AssignmentDescriptor {
    let now = now_utc();
    assignment_due(submission_type, now - Duration::days(1), now + Duration::days(7))
}

/// A published assignment whose due date passed an hour ago.
pub(crate) fn overdue_assignment(submission_type: SubmissionType) -> AssignmentDescriptor {
    let now = now_utc();
    assignment_due(submission_type, now - Duration::days(7), now - Duration::hours(1))
}

fn assignment_due(
    submission_type: SubmissionType,
    creation_date: OffsetDateTime,
    due_date: OffsetDateTime,
) -> AssignmentDescriptor {
    AssignmentDescriptor {
        id: ASSIGNMENT_ID.to_string(),
        title: "Essay on thermodynamics".to_string(),
        description: "Explain the second law in your own words.".to_string(),
        creation_date,
        due_date,
        submission_type,
        status: AssignmentStatus::Published,
        grading_criteria: Some("Clarity and correctness".to_string()),
        supporting_materials: vec![SupportingMaterial {
            kind: MaterialKind::Link,
            url: "https://example.org/lecture-4".to_string(),
            display_name: "Lecture 4".to_string(),
            description: None,
        }],
    }
}

pub(crate) fn persisted_draft(assignment: &AssignmentDescriptor) -> SubmissionRecord {
    SubmissionRecord {
        id: Some("submission-1".to_string()),
        text_response: Some("first attempt".to_string()),
        ..SubmissionRecord::new_draft(&assignment.id, AUTHOR_ID)
    }
}

/// A persisted record in `state`, with the fields that state requires.
pub(crate) fn record_in_state(
    assignment: &AssignmentDescriptor,
    state: SubmissionState,
) -> SubmissionRecord {
    let mut record = persisted_draft(assignment);
    record.state = state;
    if state != SubmissionState::Draft {
        record.submitted_at = Some(now_utc());
    }
    if state == SubmissionState::Graded {
        record.grade = Some(Grade::Points(9.0));
        record.teacher_comment = Some("Good work".to_string());
    }
    record
}

pub(crate) struct TestContext {
    pub(crate) store: InMemorySubmissionStore,
    pub(crate) controller: SubmissionFormController,
    pub(crate) assignment: AssignmentDescriptor,
}

/// Memory store seeded with `assignment` and a controller already loaded against it.
pub(crate) async fn loaded_context(
    assignment: AssignmentDescriptor,
    existing: Option<SubmissionRecord>,
) -> TestContext {
    let store = InMemorySubmissionStore::new();
    store.insert_assignment(assignment.clone()).await;
    if let Some(record) = existing {
        store.insert_submission(record).await;
    }

    let controller = SubmissionFormController::new(Arc::new(store.clone()));
    controller.load_context(&assignment.id, AUTHOR_ID).await.expect("load context");

    TestContext { store, controller, assignment }
}
