use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionType {
    Text,
    File,
    Multimedia,
    Link,
    InPerson,
    Group,
}

impl SubmissionType {
    pub const ALL: [SubmissionType; 6] = [
        SubmissionType::Text,
        SubmissionType::File,
        SubmissionType::Multimedia,
        SubmissionType::Link,
        SubmissionType::InPerson,
        SubmissionType::Group,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Multimedia => "multimedia",
            Self::Link => "link",
            Self::InPerson => "in_person",
            Self::Group => "group",
        }
    }

    /// Whether records of this type may carry attached files.
    pub fn accepts_files(self) -> bool {
        matches!(self, Self::File | Self::Multimedia)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Published,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    Draft,
    Submitted,
    Late,
    Graded,
}

impl SubmissionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Late => "late",
            Self::Graded => "graded",
        }
    }

    /// Submitted and Late both mean the attempt has been sent to the evaluator.
    pub fn is_sent(self) -> bool {
        matches!(self, Self::Submitted | Self::Late)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialKind {
    File,
    Link,
}
