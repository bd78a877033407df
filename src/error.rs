//! Error types for the registration flow.

use crate::i18n::UserMessage;
use crate::registration::rules::ValidationFailure;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors reading or verifying Telegram init data.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Init data has no hash parameter")]
    MissingHash,

    #[error("Init data signature does not match")]
    InvalidSignature,

    #[error("Init data is too old ({age_secs} seconds)")]
    Expired { age_secs: i64 },

    #[error("Malformed user object: {0}")]
    MalformedUser(#[from] serde_json::Error),

    #[error("Malformed init data field: {field}")]
    MalformedField { field: String },
}

/// Location acquisition failures, classified by cause.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Unknown location error: {0}")]
    Unknown(String),

    #[error("Geolocation is not supported")]
    Unsupported,

    #[error("Location ({lat}, {lng}) is outside the service area")]
    OutOfBounds { lat: f64, lng: f64 },
}

impl LocationError {
    pub fn user_message(&self) -> UserMessage {
        match self {
            Self::PermissionDenied => UserMessage::LocationPermissionDenied,
            Self::PositionUnavailable => UserMessage::LocationUnavailable,
            Self::Timeout => UserMessage::LocationTimeout,
            Self::Unknown(_) => UserMessage::LocationUnknown,
            Self::Unsupported => UserMessage::LocationUnsupported,
            Self::OutOfBounds { .. } => UserMessage::LocationOutOfBounds,
        }
    }
}

/// Remote store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (duplicate id or phone).
    #[error("Uniqueness conflict: {message}")]
    Conflict {
        constraint: Option<String>,
        message: String,
    },

    #[error("Store rejected request ({status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Errors returned by the registration form controller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistrationError {
    /// Another submission or location request is in flight; nothing was issued.
    #[error("Another request is in flight")]
    Busy,

    #[error("Validation failed: {0}")]
    Validation(ValidationFailure),

    #[error("Location failed: {0}")]
    Location(#[from] LocationError),

    #[error("Store write failed: {0}")]
    Store(#[from] StoreError),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl RegistrationError {
    /// The notice to show for this error. `Busy` is silent.
    pub fn user_message(&self) -> Option<UserMessage> {
        match self {
            Self::Busy => None,
            Self::Validation(failure) => Some(failure.user_message()),
            Self::Location(e) => Some(e.user_message()),
            Self::Store(e) if e.is_conflict() => Some(UserMessage::AlreadyRegistered),
            Self::Store(_) => Some(UserMessage::SubmitFailed),
            Self::Unexpected(_) => Some(UserMessage::SubmitFailed),
        }
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
