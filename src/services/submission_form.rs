//! Submission form controller.
//!
//! Owns the observable [`FormState`] of one (assignment, author) pair and drives the
//! store. Every network action holds the action lock for its whole duration, so a
//! second save/submit/delete while one is in flight fails fast with `Busy`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex, MutexGuard};

use crate::core::metrics;
use crate::core::time::{format_offset, now_utc};
use crate::domain::models::{
    AssignmentDescriptor, AttachedFile, DraftInput, SubmissionRecord, SubmissionWrite,
};
use crate::errors::{ErrorKind, SubmissionError};
use crate::services::form_state::{FormPhase, FormState};
use crate::services::lifecycle::{self, SubmissionAction};
use crate::services::validation;
use crate::store::SubmissionStore;


#[derive(Clone)]
pub struct SubmissionFormController {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn SubmissionStore>,
    state: watch::Sender<FormState>,
    action_lock: Mutex<()>,
    attached: AtomicBool,
}

struct Context {
    assignment: AssignmentDescriptor,
    record: SubmissionRecord,
}

impl SubmissionFormController {
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        let (state, _) = watch::channel(FormState::default());
        Self {
            inner: Arc::new(Inner {
                store,
                state,
                action_lock: Mutex::new(()),
                attached: AtomicBool::new(true),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> FormState {
        self.inner.state.borrow().clone()
    }

    /// Stops publishing state. Calls already in flight still run to completion, but
    /// their results are no longer applied.
    pub fn detach(&self) {
        self.inner.attached.store(false, Ordering::Release);
        tracing::debug!("Submission form detached");
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.load(Ordering::Acquire)
    }

    pub async fn load_context(
        &self,
        assignment_id: &str,
        author_id: &str,
    ) -> Result<(AssignmentDescriptor, Option<SubmissionRecord>), SubmissionError> {
        let _guard = self.begin(FormPhase::Loading)?;
        let result = self.fetch_context(assignment_id, author_id).await;

        if let Ok((assignment, existing)) = &result {
            let record = existing
                .clone()
                .unwrap_or_else(|| SubmissionRecord::new_draft(&assignment.id, author_id));
            tracing::info!(
                assignment_id,
                submission_id = record.id.as_deref().unwrap_or("-"),
                state = record.state.as_str(),
                "Submission context loaded"
            );
            self.update(|state| {
                state.assignment = Some(assignment.clone());
                state.draft = record.draft_input();
                state.record = Some(record);
                state.needs_refresh = false;
            });
        }

        self.finish("load_context", &result);
        result
    }

    /// Re-fetches the authoritative record for the loaded context.
    pub async fn refresh(&self) -> Result<Option<SubmissionRecord>, SubmissionError> {
        let (assignment_id, author_id) = {
            let state = self.inner.state.borrow();
            let record = state.record.as_ref().ok_or_else(not_loaded)?;
            (record.assignment_id.clone(), record.author_id.clone())
        };
        let (_, record) = self.load_context(&assignment_id, &author_id).await?;
        Ok(record)
    }

    pub fn validate_for_save(&self, draft: &DraftInput) -> Result<(), SubmissionError> {
        let state = self.inner.state.borrow();
        let assignment = state.assignment.as_ref().ok_or_else(not_loaded)?;
        validation::validate_for_save(assignment.submission_type, draft)
    }

    pub fn set_text_response(&self, text: impl Into<String>) -> Result<(), SubmissionError> {
        let text = text.into();
        self.edit(|_, draft| {
            draft.text_response = Some(text);
            Ok(())
        })
    }

    pub fn set_link_response(&self, link: impl Into<String>) -> Result<(), SubmissionError> {
        let link = link.into();
        self.edit(|_, draft| {
            draft.link_response = Some(link);
            Ok(())
        })
    }

    pub fn attach_file(&self, file: AttachedFile) -> Result<(), SubmissionError> {
        self.edit(|assignment, draft| {
            if !assignment.submission_type.accepts_files() {
                return Err(SubmissionError::invalid_state(format!(
                    "{} assignments do not accept files",
                    assignment.submission_type.as_str()
                )));
            }
            draft.attached_files.push(file);
            Ok(())
        })
    }

    pub fn remove_file(&self, index: usize) -> Result<AttachedFile, SubmissionError> {
        let mut removed = None;
        self.edit(|_, draft| {
            if index >= draft.attached_files.len() {
                return Err(SubmissionError::NotFound(format!("attachment {index}")));
            }
            removed = Some(draft.attached_files.remove(index));
            Ok(())
        })?;
        removed.ok_or_else(|| SubmissionError::NotFound(format!("attachment {index}")))
    }

    /// Persists the draft: creates it when nothing is stored yet, updates it otherwise.
    pub async fn save_draft(&self, draft: DraftInput) -> Result<SubmissionRecord, SubmissionError> {
        let _guard = self.begin(FormPhase::Saving)?;
        let result = self.save_draft_locked(draft).await;
        self.finish(SubmissionAction::SaveDraft.as_str(), &result);
        result
    }

    /// Persists the draft, then asks the backend to send it. When the second step
    /// fails the draft stays saved and `SubmitNotCompleted` is returned.
    pub async fn submit(&self, draft: DraftInput) -> Result<SubmissionRecord, SubmissionError> {
        let _guard = self.begin(FormPhase::Submitting)?;
        let result = self.submit_locked(draft).await;
        self.finish(SubmissionAction::Submit.as_str(), &result);
        result
    }

    pub async fn delete_draft(&self, submission_id: &str) -> Result<(), SubmissionError> {
        let _guard = self.begin(FormPhase::Deleting)?;
        let result = self.delete_draft_locked(submission_id).await;
        self.finish(SubmissionAction::DeleteDraft.as_str(), &result);
        result
    }

    async fn fetch_context(
        &self,
        assignment_id: &str,
        author_id: &str,
    ) -> Result<(AssignmentDescriptor, Option<SubmissionRecord>), SubmissionError> {
        let assignment = self.inner.store.fetch_assignment(assignment_id).await?;
        if assignment.id != assignment_id {
            return Err(SubmissionError::Decode(format!(
                "requested assignment {assignment_id} but received {}",
                assignment.id
            )));
        }
        let existing = self.inner.store.find_submission(assignment_id, author_id).await?;

        if let Some(record) = &existing {
            if record.assignment_id != assignment_id || record.author_id != author_id {
                return Err(SubmissionError::Decode(
                    "submission lookup returned a record for another assignment or author"
                        .to_string(),
                ));
            }
        }

        Ok((assignment, existing))
    }

    async fn save_draft_locked(
        &self,
        draft: DraftInput,
    ) -> Result<SubmissionRecord, SubmissionError> {
        let context = self.ready_context()?;
        self.update(|state| state.draft = draft.clone());

        lifecycle::ensure_action_allowed(
            &context.assignment,
            &context.record,
            SubmissionAction::SaveDraft,
        )?;
        validation::validate_for_save(context.assignment.submission_type, &draft)?;

        self.persist_draft(&context, &draft).await
    }

    async fn submit_locked(&self, draft: DraftInput) -> Result<SubmissionRecord, SubmissionError> {
        let context = self.ready_context()?;
        self.update(|state| state.draft = draft.clone());

        lifecycle::ensure_action_allowed(
            &context.assignment,
            &context.record,
            SubmissionAction::Submit,
        )?;
        validation::validate_for_save(context.assignment.submission_type, &draft)?;
        let expected = lifecycle::expected_submit_state(&context.assignment, now_utc())?;

        let saved = self.persist_draft(&context, &draft).await?;
        let submission_id = saved
            .id
            .clone()
            .ok_or_else(|| SubmissionError::Decode("saved draft has no id".to_string()))?;

        let submitted = match self.inner.store.submit_submission(&submission_id).await {
            Ok(record) => record,
            Err(cause) => {
                let cause = self.stale_on_not_found(cause);
                tracing::warn!(
                    submission_id = %submission_id,
                    error = %cause,
                    "Submit transition failed; draft remains saved"
                );
                return Err(SubmissionError::SubmitNotCompleted {
                    draft: Box::new(saved),
                    cause: Box::new(cause),
                });
            }
        };

        if let Err(cause) = lifecycle::verify_response(&saved, &submitted, SubmissionAction::Submit)
        {
            self.mark_stale();
            return Err(SubmissionError::SubmitNotCompleted {
                draft: Box::new(saved),
                cause: Box::new(cause),
            });
        }

        if submitted.state != expected {
            tracing::warn!(
                submission_id = %submission_id,
                expected = expected.as_str(),
                actual = submitted.state.as_str(),
                "Backend chose a different submit state than the local clock suggests"
            );
        }

        let submitted_at = submitted.submitted_at.map(format_offset).unwrap_or_default();
        tracing::info!(
            submission_id = %submission_id,
            state = submitted.state.as_str(),
            submitted_at = %submitted_at,
            "Submission sent"
        );
        self.update(|state| {
            state.draft = submitted.draft_input();
            state.record = Some(submitted.clone());
        });
        Ok(submitted)
    }

    async fn delete_draft_locked(&self, submission_id: &str) -> Result<(), SubmissionError> {
        let context = self.ready_context()?;
        lifecycle::ensure_action_allowed(
            &context.assignment,
            &context.record,
            SubmissionAction::DeleteDraft,
        )?;
        if context.record.id.as_deref() != Some(submission_id) {
            return Err(SubmissionError::NotFound(format!("submission {submission_id}")));
        }

        self.inner
            .store
            .delete_submission(submission_id)
            .await
            .map_err(|err| self.stale_on_not_found(err))?;

        tracing::info!(submission_id, "Submission draft deleted");
        let fresh =
            SubmissionRecord::new_draft(&context.record.assignment_id, &context.record.author_id);
        self.update(|state| {
            state.draft = DraftInput::default();
            state.record = Some(fresh);
        });
        Ok(())
    }

    /// One create or update call, chosen by whether the record has an id.
    async fn persist_draft(
        &self,
        context: &Context,
        draft: &DraftInput,
    ) -> Result<SubmissionRecord, SubmissionError> {
        let write =
            SubmissionWrite::from_draft(&context.assignment, &context.record.author_id, draft);
        let saved = match context.record.id.as_deref() {
            Some(submission_id) => self.inner.store.update_submission(submission_id, &write).await,
            None => self.inner.store.create_submission(&write).await,
        }
        .map_err(|err| self.stale_on_not_found(err))?;

        if let Err(err) =
            lifecycle::verify_response(&context.record, &saved, SubmissionAction::SaveDraft)
        {
            self.mark_stale();
            return Err(err);
        }

        tracing::info!(
            submission_id = saved.id.as_deref().unwrap_or("-"),
            created = !context.record.is_persisted(),
            "Submission draft saved"
        );
        self.update(|state| {
            state.draft = saved.draft_input();
            state.record = Some(saved.clone());
        });
        Ok(saved)
    }

    fn edit(
        &self,
        apply: impl FnOnce(&AssignmentDescriptor, &mut DraftInput) -> Result<(), SubmissionError>,
    ) -> Result<(), SubmissionError> {
        let _guard = self.inner.action_lock.try_lock().map_err(|_| SubmissionError::Busy)?;
        let context = self.ready_context()?;
        lifecycle::ensure_action_allowed(
            &context.assignment,
            &context.record,
            SubmissionAction::Edit,
        )?;

        let mut draft = self.inner.state.borrow().draft.clone();
        apply(&context.assignment, &mut draft)?;
        self.update(|state| state.draft = draft);
        Ok(())
    }

    fn begin(&self, phase: FormPhase) -> Result<MutexGuard<'_, ()>, SubmissionError> {
        let guard = self.inner.action_lock.try_lock().map_err(|_| {
            tracing::debug!(?phase, "Rejected action while another is in flight");
            SubmissionError::Busy
        })?;
        self.update(|state| {
            state.phase = phase;
            state.last_error = None;
        });
        Ok(guard)
    }

    fn finish<T>(&self, action: &'static str, result: &Result<T, SubmissionError>) {
        let outcome = match result {
            Ok(_) => "success",
            Err(err) if err.is_ambiguous() => "ambiguous",
            Err(_) => "failure",
        };
        metrics::record_action(action, outcome);

        if let Err(err) = result {
            tracing::warn!(action, error = %err, "Submission action failed");
        }

        self.update(|state| {
            state.phase = FormPhase::Idle;
            match result {
                Ok(_) => state.last_error = None,
                Err(err) => {
                    state.last_error = Some(err.user_message());
                    if err.is_ambiguous() {
                        state.needs_refresh = true;
                    }
                }
            }
        });
    }

    /// The local record no longer matches the server; further writes wait for a refresh.
    fn mark_stale(&self) {
        self.update(|state| state.needs_refresh = true);
    }

    /// A write that finds no record on the server means the local copy is stale.
    fn stale_on_not_found(&self, err: SubmissionError) -> SubmissionError {
        if err.kind() == ErrorKind::NotFound {
            self.mark_stale();
        }
        err
    }

    fn ready_context(&self) -> Result<Context, SubmissionError> {
        let state = self.inner.state.borrow();
        if state.needs_refresh {
            return Err(SubmissionError::RefreshRequired);
        }
        match (&state.assignment, &state.record) {
            (Some(assignment), Some(record)) => {
                Ok(Context { assignment: assignment.clone(), record: record.clone() })
            }
            _ => Err(not_loaded()),
        }
    }

    fn update(&self, modify: impl FnOnce(&mut FormState)) {
        if !self.is_attached() {
            return;
        }
        self.inner.state.send_modify(modify);
    }
}

fn not_loaded() -> SubmissionError {
    SubmissionError::invalid_state("submission context is not loaded")
}
