//! A [`WebApp`] backed by parsed init data, for running outside the Telegram client.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{InitData, LocationManager, WebApp};
use crate::error::LocationError;
use crate::identity::model::TelegramUser;
use crate::location::Coordinate;

/// Host adapter over init data handed to the process.
pub struct InitDataWebApp {
    init_data: InitData,
    location_manager: Option<Box<dyn LocationManager>>,
    alerts: Mutex<Vec<String>>,
}

impl InitDataWebApp {
    pub fn new(init_data: InitData) -> Self {
        Self {
            init_data,
            location_manager: None,
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_location_manager(mut self, manager: Box<dyn LocationManager>) -> Self {
        self.location_manager = Some(manager);
        self
    }

    /// Alerts shown so far, oldest first. The console renders form notices
    /// itself, so nothing here writes to stdout.
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl WebApp for InitDataWebApp {
    fn ready(&self) {
        debug!(query_id = ?self.init_data.query_id, "WebApp ready");
    }

    fn expand(&self) {
        debug!("WebApp expanded");
    }

    fn user(&self) -> Option<TelegramUser> {
        self.init_data.user.clone()
    }

    fn location_manager(&self) -> Option<&dyn LocationManager> {
        self.location_manager.as_deref()
    }

    fn show_alert(&self, message: &str) {
        info!(alert = %message, "WebApp alert");
        self.alerts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}

/// Location manager that returns a fixed position, or denies access when
/// none is configured.
pub struct StaticLocationManager {
    position: Option<Coordinate>,
    settings_opened: AtomicUsize,
}

impl StaticLocationManager {
    pub fn new(position: Option<Coordinate>) -> Self {
        Self {
            position,
            settings_opened: AtomicUsize::new(0),
        }
    }

    /// How many times the settings screen was requested.
    pub fn settings_opened(&self) -> usize {
        self.settings_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationManager for StaticLocationManager {
    async fn init(&self) -> Result<(), LocationError> {
        Ok(())
    }

    async fn get_location(&self) -> Result<Coordinate, LocationError> {
        self.position.ok_or(LocationError::PermissionDenied)
    }

    fn open_settings(&self) {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
        info!("Opening host location settings");
    }
}
