pub mod form_state;
pub mod lifecycle;
pub mod submission_form;
pub mod validation;
