use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use time::Duration;

use crate::core::config::Settings;
use crate::core::time::now_utc;
use crate::domain::models::{AssignmentDescriptor, AttachedFile, DraftInput};
use crate::domain::types::{AssignmentStatus, SubmissionType};
use crate::services::submission_form::SubmissionFormController;
use crate::store::InMemorySubmissionStore;

const DEMO_AUTHOR_ID: &str = "demo-student";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Show,
    Save,
    Submit,
    Delete,
    Demo,
}

impl Command {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Save => "save",
            Self::Submit => "submit",
            Self::Delete => "delete",
            Self::Demo => "demo",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "show" => Ok(Self::Show),
            "save" => Ok(Self::Save),
            "submit" => Ok(Self::Submit),
            "delete" => Ok(Self::Delete),
            "demo" => Ok(Self::Demo),
            other => Err(anyhow!("Unknown command: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub(crate) command: Command,
    pub(crate) assignment_id: String,
    pub(crate) author_id: Option<String>,
    text: Option<String>,
    link: Option<String>,
    files: Vec<PathBuf>,
}

pub(crate) fn usage() -> &'static str {
    "usage: edumon-submit <show|save|submit|delete|demo> <assignment-id> \
     [--author ID] [--text TEXT] [--link URL] [--file PATH]..."
}

pub(crate) fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut args = args.into_iter();
    let command = Command::parse(&args.next().ok_or_else(|| anyhow!(usage()))?)?;
    let assignment_id = args.next().ok_or_else(|| anyhow!(usage()))?;
    if assignment_id.starts_with("--") {
        bail!("{}", usage());
    }

    let mut parsed = CliArgs {
        command,
        assignment_id,
        author_id: None,
        text: None,
        link: None,
        files: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--author" => {
                parsed.author_id =
                    Some(args.next().ok_or_else(|| anyhow!("--author missing value"))?);
            }
            "--text" => {
                parsed.text = Some(args.next().ok_or_else(|| anyhow!("--text missing value"))?);
            }
            "--link" => {
                parsed.link = Some(args.next().ok_or_else(|| anyhow!("--link missing value"))?);
            }
            "--file" => {
                let path = args.next().ok_or_else(|| anyhow!("--file missing value"))?;
                parsed.files.push(PathBuf::from(path));
            }
            _ => return Err(anyhow!("Unknown argument: {arg}")),
        }
    }

    Ok(parsed)
}

impl CliArgs {
    pub(crate) fn resolve_author(&self, settings: &Settings) -> Result<String> {
        if let Some(author_id) = self.author_id.clone().or_else(|| settings.api().author_id.clone())
        {
            return Ok(author_id);
        }
        if self.command == Command::Demo {
            return Ok(DEMO_AUTHOR_ID.to_string());
        }
        bail!("No author id: pass --author or set EDUMON_AUTHOR_ID")
    }

    /// The loaded draft with command-line content layered on top.
    fn draft_over(&self, mut draft: DraftInput) -> DraftInput {
        if let Some(text) = &self.text {
            draft.text_response = Some(text.clone());
        }
        if let Some(link) = &self.link {
            draft.link_response = Some(link.clone());
        }
        draft.attached_files.extend(self.files.iter().map(AttachedFile::local));
        draft
    }

    fn demo_submission_type(&self) -> SubmissionType {
        if !self.files.is_empty() {
            SubmissionType::File
        } else if self.link.is_some() && self.text.is_none() {
            SubmissionType::Link
        } else {
            SubmissionType::Text
        }
    }
}

/// Runs one command to completion against an already built controller.
pub(crate) async fn execute(
    controller: &SubmissionFormController,
    args: &CliArgs,
    author_id: &str,
) -> Result<()> {
    controller
        .load_context(&args.assignment_id, author_id)
        .await
        .with_context(|| format!("Failed to load assignment {}", args.assignment_id))?;

    match args.command {
        Command::Show => {}
        Command::Save => {
            let draft = args.draft_over(controller.snapshot().draft);
            controller.save_draft(draft).await.context("Failed to save draft")?;
        }
        Command::Submit | Command::Demo => {
            let mut draft = args.draft_over(controller.snapshot().draft);
            if args.command == Command::Demo && draft == DraftInput::default() {
                draft.text_response = Some("Entropy of an isolated system never decreases.".into());
            }
            controller.submit(draft).await.context("Failed to submit")?;
        }
        Command::Delete => {
            let submission_id = controller
                .snapshot()
                .record
                .and_then(|record| record.id)
                .ok_or_else(|| anyhow!("No saved draft to delete"))?;
            controller.delete_draft(&submission_id).await.context("Failed to delete draft")?;
        }
    }

    Ok(())
}

/// In-memory backend holding a single published assignment due tomorrow.
pub(crate) async fn demo_store(args: &CliArgs) -> InMemorySubmissionStore {
    let now = now_utc();
    let store = InMemorySubmissionStore::new();
    store
        .insert_assignment(AssignmentDescriptor {
            id: args.assignment_id.clone(),
            title: "Demo assignment".to_string(),
            description: "Offline walkthrough of the submission lifecycle.".to_string(),
            creation_date: now - Duration::days(1),
            due_date: now + Duration::days(1),
            submission_type: args.demo_submission_type(),
            status: AssignmentStatus::Published,
            grading_criteria: None,
            supporting_materials: Vec::new(),
        })
        .await;
    store
}
