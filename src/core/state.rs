use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::submission_form::SubmissionFormController;
use crate::store::SubmissionStore;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    store: Arc<dyn SubmissionStore>,
}

impl AppState {
    pub(crate) fn new(settings: Settings, store: Arc<dyn SubmissionStore>) -> Self {
        Self { inner: Arc::new(InnerState { settings, store }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn store(&self) -> Arc<dyn SubmissionStore> {
        self.inner.store.clone()
    }

    pub(crate) fn controller(&self) -> SubmissionFormController {
        SubmissionFormController::new(self.store())
    }
}
