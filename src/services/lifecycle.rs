//! Submission state machine: `Draft -> {Submitted, Late} -> Graded`.
//!
//! Only Draft is editable. Submitted, Late and Graded are terminal for the submitter;
//! grading happens on the evaluator side. A Closed assignment permits no mutation.

use time::OffsetDateTime;

use crate::domain::models::{AssignmentDescriptor, SubmissionRecord};
use crate::domain::types::SubmissionState;
use crate::errors::SubmissionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionAction {
    Edit,
    SaveDraft,
    Submit,
    DeleteDraft,
}

impl SubmissionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::SaveDraft => "save_draft",
            Self::Submit => "submit",
            Self::DeleteDraft => "delete_draft",
        }
    }
}

/// State the backend is expected to pick for a submit at `now`.
pub fn expected_submit_state(
    assignment: &AssignmentDescriptor,
    now: OffsetDateTime,
) -> Result<SubmissionState, SubmissionError> {
    if !assignment.is_published() {
        return Err(SubmissionError::invalid_state("assignment is closed"));
    }
    Ok(if assignment.is_past_due(now) { SubmissionState::Late } else { SubmissionState::Submitted })
}

pub fn ensure_action_allowed(
    assignment: &AssignmentDescriptor,
    record: &SubmissionRecord,
    action: SubmissionAction,
) -> Result<(), SubmissionError> {
    if !assignment.is_published() {
        return Err(SubmissionError::invalid_state(format!(
            "cannot {} on a closed assignment",
            action.as_str()
        )));
    }

    if record.state != SubmissionState::Draft {
        return Err(SubmissionError::invalid_state(format!(
            "cannot {} a {} submission",
            action.as_str(),
            record.state.as_str()
        )));
    }

    if action == SubmissionAction::DeleteDraft && !record.is_persisted() {
        return Err(SubmissionError::invalid_state("draft has not been saved yet"));
    }

    Ok(())
}

pub fn is_editable(assignment: &AssignmentDescriptor, record: &SubmissionRecord) -> bool {
    ensure_action_allowed(assignment, record, SubmissionAction::Edit).is_ok()
}

/// Whether `to` can follow `from`. `None` is a submission that does not exist yet.
pub fn is_reachable(from: Option<SubmissionState>, to: SubmissionState) -> bool {
    use SubmissionState::{Draft, Graded, Late, Submitted};

    match (from, to) {
        (None, Draft) => true,
        (Some(Draft), Draft | Submitted | Late) => true,
        (Some(Submitted | Late), Graded) => true,
        (Some(state), next) => state == next,
        (None, _) => false,
    }
}

/// Checks that the backend's answer to `action` is a state the action can produce.
pub fn verify_response(
    prior: &SubmissionRecord,
    response: &SubmissionRecord,
    action: SubmissionAction,
) -> Result<(), SubmissionError> {
    let from = prior.is_persisted().then_some(prior.state);
    let expected = match action {
        SubmissionAction::SaveDraft => response.state == SubmissionState::Draft,
        SubmissionAction::Submit => response.state.is_sent(),
        SubmissionAction::Edit | SubmissionAction::DeleteDraft => false,
    };

    if !expected || !is_reachable(from, response.state) {
        return Err(SubmissionError::invalid_state(format!(
            "server answered {} with unexpected state {}",
            action.as_str(),
            response.state.as_str()
        )));
    }

    if prior.assignment_id != response.assignment_id || prior.author_id != response.author_id {
        return Err(SubmissionError::invalid_state(format!(
            "server answered {} with a submission owned by another assignment or author",
            action.as_str()
        )));
    }

    if prior.is_persisted() && prior.id != response.id {
        return Err(SubmissionError::invalid_state(format!(
            "server answered {} for a different submission",
            action.as_str()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AssignmentStatus, SubmissionType};
    use crate::test_support;
    use time::Duration;

    #[test]
    fn submit_before_due_expects_submitted() {
        let assignment = test_support::assignment(SubmissionType::Text);
        let now = assignment.due_date - Duration::minutes(1);
        assert_eq!(expected_submit_state(&assignment, now).unwrap(), SubmissionState::Submitted);
        assert_eq!(
            expected_submit_state(&assignment, assignment.due_date).unwrap(),
            SubmissionState::Submitted
        );
    }

    #[test]
    fn submit_after_due_expects_late() {
        let assignment = test_support::assignment(SubmissionType::Link);
        let now = assignment.due_date + Duration::seconds(1);
        assert_eq!(expected_submit_state(&assignment, now).unwrap(), SubmissionState::Late);
    }

    #[test]
    fn closed_assignment_blocks_everything() {
        let mut assignment = test_support::assignment(SubmissionType::Text);
        assignment.status = AssignmentStatus::Closed;
        let record = test_support::persisted_draft(&assignment);

        assert!(expected_submit_state(&assignment, assignment.creation_date).is_err());
        for action in [
            SubmissionAction::Edit,
            SubmissionAction::SaveDraft,
            SubmissionAction::Submit,
            SubmissionAction::DeleteDraft,
        ] {
            assert!(matches!(
                ensure_action_allowed(&assignment, &record, action),
                Err(SubmissionError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn only_drafts_accept_actions() {
        let assignment = test_support::assignment(SubmissionType::Text);
        let draft = test_support::persisted_draft(&assignment);
        assert!(ensure_action_allowed(&assignment, &draft, SubmissionAction::Submit).is_ok());
        assert!(is_editable(&assignment, &draft));

        for state in [SubmissionState::Submitted, SubmissionState::Late, SubmissionState::Graded] {
            let record = test_support::record_in_state(&assignment, state);
            assert!(!is_editable(&assignment, &record));
            assert!(ensure_action_allowed(&assignment, &record, SubmissionAction::SaveDraft)
                .is_err());
        }
    }

    #[test]
    fn unsaved_draft_cannot_be_deleted() {
        let assignment = test_support::assignment(SubmissionType::Text);
        let unsaved = SubmissionRecord::new_draft(&assignment.id, test_support::AUTHOR_ID);
        assert!(ensure_action_allowed(&assignment, &unsaved, SubmissionAction::DeleteDraft)
            .is_err());
        assert!(ensure_action_allowed(&assignment, &unsaved, SubmissionAction::SaveDraft).is_ok());
    }

    #[test]
    fn reachability_follows_lifecycle() {
        use SubmissionState::*;

        assert!(is_reachable(None, Draft));
        assert!(!is_reachable(None, Submitted));
        assert!(is_reachable(Some(Draft), Late));
        assert!(is_reachable(Some(Late), Graded));
        assert!(!is_reachable(Some(Submitted), Draft));
        assert!(!is_reachable(Some(Graded), Submitted));
        assert!(!is_reachable(Some(Draft), Graded));
    }

    #[test]
    fn verify_response_rejects_unexpected_states() {
        let assignment = test_support::assignment(SubmissionType::Text);
        let draft = test_support::persisted_draft(&assignment);

        let still_draft = draft.clone();
        assert!(verify_response(&draft, &still_draft, SubmissionAction::SaveDraft).is_ok());
        assert!(verify_response(&draft, &still_draft, SubmissionAction::Submit).is_err());

        let mut late = test_support::record_in_state(&assignment, SubmissionState::Late);
        late.id = draft.id.clone();
        assert!(verify_response(&draft, &late, SubmissionAction::Submit).is_ok());
        assert!(verify_response(&draft, &late, SubmissionAction::SaveDraft).is_err());

        late.id = Some("someone-else".to_string());
        assert!(verify_response(&draft, &late, SubmissionAction::Submit).is_err());
    }

    #[test]
    fn verify_response_checks_owner_on_create() {
        let assignment = test_support::assignment(SubmissionType::Text);
        let unsaved = SubmissionRecord::new_draft(&assignment.id, test_support::AUTHOR_ID);
        let created = test_support::persisted_draft(&assignment);
        assert!(verify_response(&unsaved, &created, SubmissionAction::SaveDraft).is_ok());

        let mut foreign = created.clone();
        foreign.author_id = "author-2".to_string();
        assert!(matches!(
            verify_response(&unsaved, &foreign, SubmissionAction::SaveDraft),
            Err(SubmissionError::InvalidState(_))
        ));

        let mut other_assignment = created;
        other_assignment.assignment_id = "assignment-2".to_string();
        assert!(verify_response(&unsaved, &other_assignment, SubmissionAction::SaveDraft).is_err());
    }
}
