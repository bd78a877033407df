//! Registration screen: phone and location collection, validation, and the
//! profile write.

pub mod form;
pub mod phone;
pub mod rules;
pub mod state;

pub use form::{DEFAULT_RESET_DELAY, FormConfig, RegistrationForm, SubmitMode};
pub use phone::{
    PHONE_LENGTH, PHONE_PREFIX, format_phone_display, is_complete_phone, matches_phone_pattern,
    normalize_phone,
};
pub use rules::{PhoneCheck, RuleSet, ValidationFailure, ValidationRule};
pub use state::{FormSnapshot, FormState, SubmissionStatus, SubmitFailure};
