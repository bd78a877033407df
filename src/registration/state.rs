//! Form state and the snapshot handed to the UI.

use serde::Serialize;

use super::phone::PHONE_PREFIX;
use crate::i18n::UserMessage;
use crate::location::Coordinate;

/// Why a submission failed, as far as the UI cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitFailure {
    /// Duplicate identity or phone.
    Conflict,
    /// Any other store error.
    Store,
    /// Something outside the store contract went wrong.
    Unexpected,
}

/// Submission status shown by the form. `None` in [`FormState`] means idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum SubmissionStatus {
    Submitting,
    Success,
    Error(SubmitFailure),
}

/// Mutable form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub phone_number: String,
    pub location: Option<Coordinate>,
    pub status: Option<SubmissionStatus>,
    /// Inline message for the last action.
    pub notice: Option<UserMessage>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            phone_number: PHONE_PREFIX.to_string(),
            location: None,
            status: None,
            notice: None,
        }
    }
}

impl FormState {
    /// Back to the initial, empty form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Read-only view of the form for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub phone_number: String,
    pub phone_display: String,
    pub location: Option<Coordinate>,
    pub status: Option<SubmissionStatus>,
    pub notice: Option<UserMessage>,
    /// A location request is in flight; the location control is disabled.
    pub locating: bool,
    /// A submission is in flight; every control is disabled.
    pub submitting: bool,
}
