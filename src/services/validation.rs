use crate::domain::models::DraftInput;
use crate::domain::types::SubmissionType;
use crate::errors::SubmissionError;

/// Client-side content rules for save and submit. InPerson and Group submissions are
/// defined by the server and need no content here.
pub fn validate_for_save(
    submission_type: SubmissionType,
    draft: &DraftInput,
) -> Result<(), SubmissionError> {
    let satisfied = match submission_type {
        SubmissionType::Text => draft.has_text(),
        SubmissionType::Link => draft.has_link(),
        SubmissionType::File | SubmissionType::Multimedia => draft.has_files() || draft.has_text(),
        SubmissionType::InPerson | SubmissionType::Group => true,
    };

    if satisfied {
        Ok(())
    } else {
        Err(SubmissionError::EmptyContent { submission_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::AttachedFile;

    fn with_file() -> DraftInput {
        DraftInput {
            attached_files: vec![AttachedFile::remote("https://files/1", "photo.jpg")],
            ..DraftInput::default()
        }
    }

    #[test]
    fn empty_draft_is_rejected_unless_server_defined() {
        let empty = DraftInput::default();
        for submission_type in SubmissionType::ALL {
            let result = validate_for_save(submission_type, &empty);
            match submission_type {
                SubmissionType::InPerson | SubmissionType::Group => assert!(result.is_ok()),
                _ => assert!(
                    matches!(
                        result,
                        Err(SubmissionError::EmptyContent { submission_type: t })
                            if t == submission_type
                    ),
                    "{submission_type:?} accepted empty content"
                ),
            }
        }
    }

    #[test]
    fn text_requires_non_blank_text() {
        assert!(validate_for_save(SubmissionType::Text, &DraftInput::text("answer")).is_ok());
        assert!(validate_for_save(SubmissionType::Text, &DraftInput::text("  ")).is_err());
        assert!(validate_for_save(SubmissionType::Text, &DraftInput::link("https://x")).is_err());
        assert!(validate_for_save(SubmissionType::Text, &with_file()).is_err());
    }

    #[test]
    fn link_requires_link() {
        assert!(validate_for_save(SubmissionType::Link, &DraftInput::link("https://x")).is_ok());
        assert!(validate_for_save(SubmissionType::Link, &DraftInput::text("answer")).is_err());
    }

    #[test]
    fn file_types_accept_files_or_text() {
        for submission_type in [SubmissionType::File, SubmissionType::Multimedia] {
            assert!(validate_for_save(submission_type, &with_file()).is_ok());
            assert!(validate_for_save(submission_type, &DraftInput::text("notes")).is_ok());
            assert!(validate_for_save(submission_type, &DraftInput::link("https://x")).is_err());
        }
    }
}
