use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::{require_non_empty, DecodeError};
use crate::domain::models::{AttachedFile, Grade, SubmissionRecord, SubmissionWrite};
use crate::domain::types::SubmissionState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionPayload {
    id: String,
    assignment_id: String,
    author_id: String,
    #[serde(default)]
    text_response: Option<String>,
    #[serde(default)]
    link_response: Option<String>,
    attached_files: Vec<AttachmentPayload>,
    state: SubmissionState,
    #[serde(default, with = "time::serde::rfc3339::option")]
    submitted_at: Option<OffsetDateTime>,
    #[serde(default)]
    grade: Option<Grade>,
    #[serde(default)]
    teacher_comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttachmentPayload {
    pub(crate) url: String,
    pub(crate) display_name: String,
}

/// JSON body for `POST submission` and `PATCH submission/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionWritePayload<'a> {
    pub(crate) assignment_id: &'a str,
    pub(crate) author_id: &'a str,
    pub(crate) text_response: Option<&'a str>,
    pub(crate) link_response: Option<&'a str>,
    pub(crate) attached_files: Vec<AttachmentPayload>,
}

impl<'a> SubmissionWritePayload<'a> {
    /// Builds the JSON body. Local files are not representable here and are skipped;
    /// callers switch to multipart when any are present.
    pub(crate) fn from_write(write: &'a SubmissionWrite) -> Self {
        Self {
            assignment_id: &write.assignment_id,
            author_id: &write.author_id,
            text_response: write.text_response.as_deref(),
            link_response: write.link_response.as_deref(),
            attached_files: remote_attachments(&write.attached_files),
        }
    }
}

pub(crate) fn remote_attachments(files: &[AttachedFile]) -> Vec<AttachmentPayload> {
    files
        .iter()
        .filter_map(|file| match file {
            AttachedFile::Remote { url, display_name } => {
                Some(AttachmentPayload { url: url.clone(), display_name: display_name.clone() })
            }
            AttachedFile::Local { .. } => None,
        })
        .collect()
}

impl TryFrom<SubmissionPayload> for SubmissionRecord {
    type Error = DecodeError;

    fn try_from(payload: SubmissionPayload) -> Result<Self, Self::Error> {
        require_non_empty("id", &payload.id)?;
        require_non_empty("assignmentId", &payload.assignment_id)?;
        require_non_empty("authorId", &payload.author_id)?;

        match payload.state {
            SubmissionState::Draft => {
                if payload.grade.is_some() {
                    return Err(DecodeError::Invariant(
                        "draft submission must not carry a grade".to_string(),
                    ));
                }
                if payload.submitted_at.is_some() {
                    return Err(DecodeError::Invariant(
                        "draft submission must not carry submittedAt".to_string(),
                    ));
                }
            }
            SubmissionState::Submitted | SubmissionState::Late | SubmissionState::Graded => {
                if payload.submitted_at.is_none() {
                    return Err(DecodeError::Invariant(format!(
                        "{} submission must carry submittedAt",
                        payload.state.as_str()
                    )));
                }
            }
        }

        let attached_files = payload
            .attached_files
            .into_iter()
            .map(|file| {
                require_non_empty("attachedFiles.url", &file.url)?;
                Ok(AttachedFile::Remote { url: file.url, display_name: file.display_name })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        Ok(SubmissionRecord {
            id: Some(payload.id),
            assignment_id: payload.assignment_id,
            author_id: payload.author_id,
            text_response: payload.text_response,
            link_response: payload.link_response,
            attached_files,
            state: payload.state,
            submitted_at: payload.submitted_at,
            grade: payload.grade,
            teacher_comment: payload.teacher_comment,
        })
    }
}

pub(crate) fn decode_submission(body: &str) -> Result<SubmissionRecord, DecodeError> {
    let payload: SubmissionPayload = serde_json::from_str(body)?;
    payload.try_into()
}

/// Decodes the lookup response, where `null`, a blank body or `[]` mean no submission.
pub(crate) fn decode_optional_submission(
    body: &str,
) -> Result<Option<SubmissionRecord>, DecodeError> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(body)?;
    match value {
        Value::Null => Ok(None),
        Value::Array(mut items) => match items.len() {
            0 => Ok(None),
            1 => {
                let payload: SubmissionPayload = serde_json::from_value(items.remove(0))?;
                Ok(Some(payload.try_into()?))
            }
            count => Err(DecodeError::Invariant(format!(
                "expected at most one submission per assignment and author, got {count}"
            ))),
        },
        other => {
            let payload: SubmissionPayload = serde_json::from_value(other)?;
            Ok(Some(payload.try_into()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft_payload() -> Value {
        json!({
            "id": "submission-1",
            "assignmentId": "assignment-1",
            "authorId": "author-1",
            "textResponse": "my answer",
            "linkResponse": null,
            "attachedFiles": [{"url": "https://files/1", "displayName": "scan.png"}],
            "state": "DRAFT",
            "submittedAt": null,
            "grade": null,
            "teacherComment": null
        })
    }

    #[test]
    fn decodes_draft() {
        let record = decode_submission(&draft_payload().to_string()).expect("record");

        assert_eq!(record.id.as_deref(), Some("submission-1"));
        assert_eq!(record.state, SubmissionState::Draft);
        assert_eq!(
            record.attached_files,
            vec![AttachedFile::remote("https://files/1", "scan.png")]
        );
    }

    #[test]
    fn decodes_graded_with_label_grade() {
        let mut value = draft_payload();
        value["state"] = json!("GRADED");
        value["submittedAt"] = json!("2026-10-01T12:00:00Z");
        value["grade"] = json!("A-");
        value["teacherComment"] = json!("Well argued");

        let record = decode_submission(&value.to_string()).expect("record");

        assert_eq!(record.grade, Some(Grade::Label("A-".to_string())));
        assert!(record.submitted_at.is_some());
    }

    #[test]
    fn graded_without_submitted_at_is_rejected() {
        let mut value = draft_payload();
        value["state"] = json!("GRADED");
        value["grade"] = json!(9.5);

        let err = decode_submission(&value.to_string()).unwrap_err();
        assert!(matches!(err, DecodeError::Invariant(_)), "{err}");
    }

    #[test]
    fn draft_with_grade_is_rejected() {
        let mut value = draft_payload();
        value["grade"] = json!(10);

        assert!(matches!(
            decode_submission(&value.to_string()),
            Err(DecodeError::Invariant(_))
        ));
    }

    #[test]
    fn missing_attached_files_is_rejected() {
        let mut value = draft_payload();
        value.as_object_mut().unwrap().remove("attachedFiles");

        assert!(matches!(decode_submission(&value.to_string()), Err(DecodeError::Json(_))));
    }

    #[test]
    fn optional_lookup_treats_empty_bodies_as_absent() {
        assert!(decode_optional_submission("").unwrap().is_none());
        assert!(decode_optional_submission("null").unwrap().is_none());
        assert!(decode_optional_submission("[]").unwrap().is_none());

        let single = json!([draft_payload()]).to_string();
        assert!(decode_optional_submission(&single).unwrap().is_some());

        let duplicate = json!([draft_payload(), draft_payload()]).to_string();
        assert!(decode_optional_submission(&duplicate).is_err());
    }

    #[test]
    fn write_payload_skips_local_files() {
        let write = SubmissionWrite {
            assignment_id: "assignment-1".to_string(),
            author_id: "author-1".to_string(),
            text_response: Some("answer".to_string()),
            link_response: None,
            attached_files: vec![
                AttachedFile::remote("https://files/1", "kept.pdf"),
                AttachedFile::local("/tmp/new.pdf"),
            ],
        };

        let value = serde_json::to_value(SubmissionWritePayload::from_write(&write)).unwrap();

        assert_eq!(value["assignmentId"], "assignment-1");
        assert_eq!(value["linkResponse"], Value::Null);
        assert_eq!(
            value["attachedFiles"],
            json!([{"url": "https://files/1", "displayName": "kept.pdf"}])
        );
    }
}
