use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::types::{AssignmentStatus, MaterialKind, SubmissionState, SubmissionType};

/// Read-only assignment metadata that parameterizes what a submission must contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDescriptor {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    pub submission_type: SubmissionType,
    pub status: AssignmentStatus,
    pub grading_criteria: Option<String>,
    pub supporting_materials: Vec<SupportingMaterial>,
}

impl AssignmentDescriptor {
    pub fn is_published(&self) -> bool {
        self.status == AssignmentStatus::Published
    }

    pub fn is_past_due(&self, now: OffsetDateTime) -> bool {
        now > self.due_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportingMaterial {
    pub kind: MaterialKind,
    pub url: String,
    pub display_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Grade {
    Points(f64),
    Label(String),
}

/// Opaque reference to a file attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum AttachedFile {
    /// Already stored by the backend.
    #[serde(rename_all = "camelCase")]
    Remote { url: String, display_name: String },
    /// Picked on this device and not uploaded yet.
    #[serde(rename_all = "camelCase")]
    Local { path: PathBuf, display_name: String, mime_type: Option<String> },
}

impl AttachedFile {
    pub fn remote(url: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::Remote { url: url.into(), display_name: display_name.into() }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToString::to_string)
            .unwrap_or_else(|| "attachment".to_string());
        Self::Local { path, display_name, mime_type: None }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Remote { display_name, .. } | Self::Local { display_name, .. } => display_name,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }
}

/// One user's attempt at an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: Option<String>,
    pub assignment_id: String,
    pub author_id: String,
    pub text_response: Option<String>,
    pub link_response: Option<String>,
    pub attached_files: Vec<AttachedFile>,
    pub state: SubmissionState,
    #[serde(with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
    pub grade: Option<Grade>,
    pub teacher_comment: Option<String>,
}

impl SubmissionRecord {
    /// A Draft that has not been persisted yet.
    pub fn new_draft(assignment_id: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            id: None,
            assignment_id: assignment_id.into(),
            author_id: author_id.into(),
            text_response: None,
            link_response: None,
            attached_files: Vec::new(),
            state: SubmissionState::Draft,
            submitted_at: None,
            grade: None,
            teacher_comment: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn draft_input(&self) -> DraftInput {
        DraftInput {
            text_response: self.text_response.clone(),
            link_response: self.link_response.clone(),
            attached_files: self.attached_files.clone(),
        }
    }
}

/// Editable form content collected from the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInput {
    pub text_response: Option<String>,
    pub link_response: Option<String>,
    pub attached_files: Vec<AttachedFile>,
}

impl DraftInput {
    pub fn text(value: impl Into<String>) -> Self {
        Self { text_response: Some(value.into()), ..Self::default() }
    }

    pub fn link(value: impl Into<String>) -> Self {
        Self { link_response: Some(value.into()), ..Self::default() }
    }

    pub fn has_text(&self) -> bool {
        is_filled(self.text_response.as_deref())
    }

    pub fn has_link(&self) -> bool {
        is_filled(self.link_response.as_deref())
    }

    pub fn has_files(&self) -> bool {
        !self.attached_files.is_empty()
    }
}

/// Create/update payload for the submission store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionWrite {
    pub assignment_id: String,
    pub author_id: String,
    pub text_response: Option<String>,
    pub link_response: Option<String>,
    pub attached_files: Vec<AttachedFile>,
}

impl SubmissionWrite {
    pub fn from_draft(
        assignment: &AssignmentDescriptor,
        author_id: &str,
        draft: &DraftInput,
    ) -> Self {
        let attached_files = if assignment.submission_type.accepts_files() {
            draft.attached_files.clone()
        } else {
            Vec::new()
        };

        Self {
            assignment_id: assignment.id.clone(),
            author_id: author_id.to_string(),
            text_response: filled(draft.text_response.as_deref()),
            link_response: filled(draft.link_response.as_deref()),
            attached_files,
        }
    }

    pub fn has_local_files(&self) -> bool {
        self.attached_files.iter().any(AttachedFile::is_local)
    }
}

fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}

fn filled(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty()).map(ToString::to_string)
}
