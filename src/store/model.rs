//! The `profiles` row written by both screens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::model::{DEFAULT_LANGUAGE_CODE, IdentitySource, UserIdentity};
use crate::location::Coordinate;

/// Username written when the host user has none.
pub const FALLBACK_USERNAME: &str = "telegram_user";
/// Phone written at bootstrap when the host supplies none.
pub const FALLBACK_PHONE: &str = "+998000000000";

fn default_language_code() -> String {
    DEFAULT_LANGUAGE_CODE.to_string()
}

/// A row in the `profiles` table.
///
/// `None` fields are left out of the JSON body, so an upsert only touches
/// the columns it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<i64>,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    /// The record written on the entry screen, before the user has filled
    /// in the form.
    pub fn bootstrap(identity: &UserIdentity, location: Option<Coordinate>) -> Self {
        let telegram_phone = match identity.source {
            IdentitySource::Host => identity.phone_number.clone(),
            IdentitySource::Local => None,
        };
        Self {
            id: identity.id.clone(),
            phone_number: identity
                .phone_number
                .clone()
                .unwrap_or_else(|| FALLBACK_PHONE.to_string()),
            telegram_phone,
            location_lat: location.map(|c| c.lat),
            location_lng: location.map(|c| c.lng),
            username: Some(
                identity
                    .username
                    .clone()
                    .unwrap_or_else(|| FALLBACK_USERNAME.to_string()),
            ),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            photo_url: identity.photo_url.clone(),
            telegram_id: identity.telegram_id,
            language_code: identity.language_code.clone(),
            created_at: None,
        }
    }

    /// The record written when the registration form is submitted.
    pub fn registration(
        identity: &UserIdentity,
        phone_number: &str,
        location: Coordinate,
        now: DateTime<Utc>,
    ) -> Self {
        let telegram_phone = match identity.source {
            IdentitySource::Host => identity.phone_number.clone(),
            IdentitySource::Local => None,
        };
        Self {
            id: identity.id.clone(),
            phone_number: phone_number.to_string(),
            telegram_phone,
            location_lat: Some(location.lat),
            location_lng: Some(location.lng),
            username: identity.username.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            photo_url: identity.photo_url.clone(),
            telegram_id: identity.telegram_id,
            language_code: identity.language_code.clone(),
            created_at: Some(now),
        }
    }

    pub fn location(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.location_lat?, self.location_lng?))
    }

    /// Overlay the columns `other` carries, the way a merge upsert does.
    pub fn merge_from(&mut self, other: &ProfileRecord) {
        self.phone_number.clone_from(&other.phone_number);
        self.language_code.clone_from(&other.language_code);
        merge(&mut self.telegram_phone, &other.telegram_phone);
        merge(&mut self.location_lat, &other.location_lat);
        merge(&mut self.location_lng, &other.location_lng);
        merge(&mut self.username, &other.username);
        merge(&mut self.first_name, &other.first_name);
        merge(&mut self.last_name, &other.last_name);
        merge(&mut self.photo_url, &other.photo_url);
        merge(&mut self.telegram_id, &other.telegram_id);
        merge(&mut self.created_at, &other.created_at);
    }
}

fn merge<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if source.is_some() {
        target.clone_from(source);
    }
}
