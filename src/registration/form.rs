//! RegistrationForm: phone + location collection, validation, and
//! submission with observable status.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::phone::{format_phone_display, normalize_phone};
use super::rules::{PhoneCheck, RuleSet, ValidationFailure};
use super::state::{FormSnapshot, FormState, SubmissionStatus, SubmitFailure};
use crate::error::{ConfigError, RegistrationError};
use crate::host::WebApp;
use crate::i18n::{Locale, UserMessage};
use crate::identity::UserIdentity;
use crate::location::{Coordinate, LocationSource};
use crate::store::{ProfileRecord, ProfileStore};

/// Delay before a successful form clears itself.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(3);

/// Which store operation a submission uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    /// Insert or update by `id`; re-submitting is idempotent.
    #[default]
    Upsert,
    /// Plain insert; a second submission for the same `id` conflicts.
    Insert,
}

impl FromStr for SubmitMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upsert" => Ok(Self::Upsert),
            "insert" => Ok(Self::Insert),
            other => Err(ConfigError::InvalidValue {
                key: "NOVA_SUBMIT_MODE".into(),
                message: format!("expected `upsert` or `insert`, got `{other}`"),
            }),
        }
    }
}

/// Form behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    pub phone_check: PhoneCheck,
    pub submit_mode: SubmitMode,
    /// Clear the form this long after a success. `None` keeps it filled.
    pub reset_delay: Option<Duration>,
    /// Show a host alert after a successful submission.
    pub notify_host: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            phone_check: PhoneCheck::default(),
            submit_mode: SubmitMode::default(),
            reset_delay: Some(DEFAULT_RESET_DELAY),
            notify_host: true,
        }
    }
}

/// Claims an in-flight flag and releases it on drop, including on unwind.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The registration screen's controller.
pub struct RegistrationForm {
    identity: UserIdentity,
    store: Arc<dyn ProfileStore>,
    locator: Arc<dyn LocationSource>,
    host: Option<Arc<dyn WebApp>>,
    config: FormConfig,
    rules: RuleSet,
    state: Arc<RwLock<FormState>>,
    submitting: AtomicBool,
    locating: AtomicBool,
    pending_reset: Mutex<Option<JoinHandle<()>>>,
}

impl RegistrationForm {
    pub fn new(
        identity: UserIdentity,
        store: Arc<dyn ProfileStore>,
        locator: Arc<dyn LocationSource>,
        config: FormConfig,
    ) -> Self {
        let rules = RuleSet::default_rules(config.phone_check);
        Self {
            identity,
            store,
            locator,
            host: None,
            config,
            rules,
            state: Arc::new(RwLock::new(FormState::default())),
            submitting: AtomicBool::new(false),
            locating: AtomicBool::new(false),
            pending_reset: Mutex::new(None),
        }
    }

    /// Attach the host client used for success alerts.
    pub fn with_host(mut self, host: Arc<dyn WebApp>) -> Self {
        self.host = Some(host);
        self
    }

    /// Replace the validation rules.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn locale(&self) -> Locale {
        self.identity.locale()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    pub fn is_locating(&self) -> bool {
        self.locating.load(Ordering::SeqCst)
    }

    /// Current form contents and flags.
    pub async fn snapshot(&self) -> FormSnapshot {
        let state = self.state.read().await;
        FormSnapshot {
            phone_number: state.phone_number.clone(),
            phone_display: format_phone_display(&state.phone_number),
            location: state.location,
            status: state.status,
            notice: state.notice,
            locating: self.is_locating(),
            submitting: self.is_submitting(),
        }
    }

    /// Apply a phone input change. Ignored while a submission is in flight.
    pub async fn input_phone(&self, raw: &str) -> bool {
        if self.is_submitting() {
            debug!("Phone input ignored while submitting");
            return false;
        }
        self.cancel_pending_reset().await;
        let normalized = normalize_phone(raw);
        self.state.write().await.phone_number = normalized;
        true
    }

    /// Request a location fix and store it on success.
    ///
    /// Returns [`RegistrationError::Busy`] without touching the locator when
    /// a location request or a submission is already in flight.
    pub async fn request_location(&self) -> Result<Coordinate, RegistrationError> {
        if self.is_submitting() {
            debug!("Location request ignored while submitting");
            return Err(RegistrationError::Busy);
        }
        let Some(_guard) = InFlight::claim(&self.locating) else {
            debug!("Location request already in flight");
            return Err(RegistrationError::Busy);
        };
        self.cancel_pending_reset().await;

        let result = self.locator.locate().await;

        let mut state = self.state.write().await;
        match result {
            Ok(position) => {
                info!(
                    user_id = %self.identity.id,
                    strategy = self.locator.name(),
                    lat = position.lat,
                    lng = position.lng,
                    "Location set"
                );
                state.location = Some(position);
                state.notice = None;
                Ok(position)
            }
            Err(e) => {
                warn!(
                    user_id = %self.identity.id,
                    strategy = self.locator.name(),
                    error = %e,
                    "Location request failed"
                );
                state.notice = Some(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Clear the location without submitting.
    pub async fn clear_location(&self) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.cancel_pending_reset().await;
        self.state.write().await.location = None;
        true
    }

    /// Validate and write the profile.
    ///
    /// The submitting flag is claimed before anything else, so a second call
    /// while this one is in flight returns [`RegistrationError::Busy`] and
    /// issues no write.
    pub async fn submit(&self) -> Result<ProfileRecord, RegistrationError> {
        let Some(_guard) = InFlight::claim(&self.submitting) else {
            debug!("Submit ignored; already submitting");
            return Err(RegistrationError::Busy);
        };
        self.cancel_pending_reset().await;

        let (phone_number, location) = {
            let mut state = self.state.write().await;
            let validated = self
                .rules
                .evaluate(&state)
                .and_then(|()| state.location.ok_or(ValidationFailure::LocationRequired));
            let location = match validated {
                Ok(location) => location,
                Err(failure) => {
                    info!(user_id = %self.identity.id, %failure, "Registration rejected");
                    state.notice = Some(failure.user_message());
                    return Err(RegistrationError::Validation(failure));
                }
            };
            state.status = Some(SubmissionStatus::Submitting);
            state.notice = None;
            (state.phone_number.clone(), location)
        };

        let record =
            ProfileRecord::registration(&self.identity, &phone_number, location, Utc::now());
        let result = self.write(&record).await;

        match result {
            Ok(stored) => {
                info!(user_id = %stored.id, "Registration saved");
                self.finish_success().await;
                Ok(stored)
            }
            Err(e) => {
                error!(user_id = %self.identity.id, error = %e, "Registration failed");
                self.finish_failure(&e).await;
                Err(e)
            }
        }
    }

    /// One store write. Panics inside the store are caught and reported as
    /// [`RegistrationError::Unexpected`].
    async fn write(&self, record: &ProfileRecord) -> Result<ProfileRecord, RegistrationError> {
        let write = async {
            match self.config.submit_mode {
                SubmitMode::Upsert => self.store.upsert(record).await,
                SubmitMode::Insert => self.store.insert(record).await,
            }
        };
        match AssertUnwindSafe(write).catch_unwind().await {
            Ok(Ok(stored)) => Ok(stored),
            Ok(Err(e)) => Err(RegistrationError::Store(e)),
            Err(panic) => Err(RegistrationError::Unexpected(panic_message(panic.as_ref()))),
        }
    }

    async fn finish_success(&self) {
        {
            let mut state = self.state.write().await;
            state.status = Some(SubmissionStatus::Success);
            state.notice = Some(UserMessage::RegistrationComplete);
        }

        if self.config.notify_host
            && let Some(host) = self.host.as_ref()
        {
            host.show_alert(UserMessage::RegistrationComplete.text(self.locale()));
        }

        self.schedule_reset().await;
    }

    async fn finish_failure(&self, err: &RegistrationError) {
        let failure = match err {
            RegistrationError::Store(e) if e.is_conflict() => SubmitFailure::Conflict,
            RegistrationError::Store(_) => SubmitFailure::Store,
            _ => SubmitFailure::Unexpected,
        };
        let mut state = self.state.write().await;
        state.status = Some(SubmissionStatus::Error(failure));
        state.notice = err.user_message();
    }

    /// Drop a reset that has not fired yet, so it cannot wipe input entered
    /// after the success that scheduled it.
    async fn cancel_pending_reset(&self) {
        if let Some(handle) = self.pending_reset.lock().await.take() {
            debug!("Pending form reset cancelled");
            handle.abort();
        }
    }

    /// Clear the form once after the configured delay. A newer success
    /// replaces a reset that has not fired yet.
    async fn schedule_reset(&self) {
        let Some(delay) = self.config.reset_delay else {
            return;
        };
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.write().await.reset();
            debug!("Registration form reset");
        });
        if let Some(previous) = self.pending_reset.lock().await.replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for RegistrationForm {
    fn drop(&mut self) {
        if let Some(handle) = self.pending_reset.get_mut().take() {
            handle.abort();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "store write panicked".to_string()
    }
}
