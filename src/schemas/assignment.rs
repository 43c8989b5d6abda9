use serde::Deserialize;
use time::OffsetDateTime;

use super::{require_non_empty, DecodeError};
use crate::domain::models::{AssignmentDescriptor, SupportingMaterial};
use crate::domain::types::{AssignmentStatus, MaterialKind, SubmissionType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignmentPayload {
    id: String,
    title: String,
    description: String,
    #[serde(with = "time::serde::rfc3339")]
    creation_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    due_date: OffsetDateTime,
    submission_type: SubmissionType,
    status: AssignmentStatus,
    #[serde(default)]
    grading_criteria: Option<String>,
    supporting_materials: Vec<SupportingMaterialPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SupportingMaterialPayload {
    kind: MaterialKind,
    url: String,
    display_name: String,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<AssignmentPayload> for AssignmentDescriptor {
    type Error = DecodeError;

    fn try_from(payload: AssignmentPayload) -> Result<Self, Self::Error> {
        require_non_empty("id", &payload.id)?;

        let supporting_materials = payload
            .supporting_materials
            .into_iter()
            .map(|material| {
                require_non_empty("supportingMaterials.url", &material.url)?;
                Ok(SupportingMaterial {
                    kind: material.kind,
                    url: material.url,
                    display_name: material.display_name,
                    description: material.description,
                })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        Ok(AssignmentDescriptor {
            id: payload.id,
            title: payload.title,
            description: payload.description,
            creation_date: payload.creation_date,
            due_date: payload.due_date,
            submission_type: payload.submission_type,
            status: payload.status,
            grading_criteria: payload.grading_criteria,
            supporting_materials,
        })
    }
}

pub(crate) fn decode_assignment(body: &str) -> Result<AssignmentDescriptor, DecodeError> {
    let payload: AssignmentPayload = serde_json::from_str(body)?;
    payload.try_into()
}
