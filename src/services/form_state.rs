use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::core::time::describe_due;
use crate::domain::models::{AssignmentDescriptor, DraftInput, SubmissionRecord};
use crate::domain::types::SubmissionState;
use crate::services::lifecycle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    #[default]
    Idle,
    Loading,
    Saving,
    Submitting,
    Deleting,
}

/// Everything a submission screen renders. Owned by the controller and published to
/// observers; observers never mutate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub assignment: Option<AssignmentDescriptor>,
    /// Last server-confirmed record, or an unsaved Draft when none exists yet.
    pub record: Option<SubmissionRecord>,
    /// Local, possibly unsaved, form content.
    pub draft: DraftInput,
    pub phase: FormPhase,
    /// Set after an ambiguous outcome; mutating actions wait for a refresh.
    pub needs_refresh: bool,
    pub last_error: Option<String>,
}

impl FormState {
    pub fn is_loaded(&self) -> bool {
        self.assignment.is_some() && self.record.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.phase != FormPhase::Idle
    }

    pub fn is_editable(&self) -> bool {
        match (&self.assignment, &self.record) {
            (Some(assignment), Some(record)) => {
                !self.needs_refresh && !self.is_busy() && lifecycle::is_editable(assignment, record)
            }
            _ => false,
        }
    }

    pub fn can_delete(&self) -> bool {
        self.is_editable() && self.record.as_ref().is_some_and(SubmissionRecord::is_persisted)
    }

    pub fn status_label(&self) -> &'static str {
        match &self.record {
            None => "Loading",
            Some(record) if !record.is_persisted() => "Not submitted",
            Some(record) => match record.state {
                SubmissionState::Draft => "Draft saved",
                SubmissionState::Submitted => "Submitted",
                SubmissionState::Late => "Submitted late",
                SubmissionState::Graded => "Graded",
            },
        }
    }

    pub fn due_label(&self, now: OffsetDateTime) -> Option<String> {
        self.assignment.as_ref().map(|assignment| describe_due(assignment.due_date, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SubmissionType;
    use crate::test_support;

    #[test]
    fn default_state_is_not_editable() {
        let state = FormState::default();
        assert!(!state.is_loaded());
        assert!(!state.is_editable());
        assert_eq!(state.status_label(), "Loading");
    }

    #[test]
    fn unsaved_draft_is_editable_but_not_deletable() {
        let assignment = test_support::assignment(SubmissionType::Text);
        let state = FormState {
            record: Some(SubmissionRecord::new_draft(&assignment.id, test_support::AUTHOR_ID)),
            assignment: Some(assignment),
            ..FormState::default()
        };

        assert!(state.is_editable());
        assert!(!state.can_delete());
        assert_eq!(state.status_label(), "Not submitted");
    }

    #[test]
    fn pending_refresh_locks_the_form() {
        let assignment = test_support::assignment(SubmissionType::Text);
        let state = FormState {
            record: Some(test_support::persisted_draft(&assignment)),
            assignment: Some(assignment),
            needs_refresh: true,
            ..FormState::default()
        };

        assert!(!state.is_editable());
        assert_eq!(state.status_label(), "Draft saved");
    }

    #[test]
    fn state_serializes_for_observers() {
        let assignment = test_support::assignment(SubmissionType::Link);
        let state = FormState {
            record: Some(test_support::record_in_state(&assignment, SubmissionState::Late)),
            assignment: Some(assignment),
            phase: FormPhase::Submitting,
            ..FormState::default()
        };

        let value = serde_json::to_value(&state).expect("json");
        assert_eq!(value["phase"], "submitting");
        assert_eq!(value["record"]["state"], "LATE");
        assert_eq!(value["needsRefresh"], false);
    }
}
