//! Telegram WebApp init data: parsing and signature verification.
//!
//! Telegram signs the init data query string with HMAC-SHA256. The key is
//! `HMAC_SHA256(key = "WebAppData", msg = bot_token)`, and the signed
//! message is every `key=value` pair except `hash`, sorted by key and joined
//! with `\n`.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::IdentityError;
use crate::identity::model::TelegramUser;

type HmacSha256 = Hmac<Sha256>;

/// Default freshness window for init data.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Parsed init data.
#[derive(Debug, Clone)]
pub struct InitData {
    pub query_id: Option<String>,
    pub user: Option<TelegramUser>,
    pub auth_date: Option<DateTime<Utc>>,
    pub hash: Option<String>,
    fields: BTreeMap<String, String>,
}

impl InitData {
    /// Parse the raw query string without checking the signature.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let fields: BTreeMap<String, String> = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let user = fields
            .get("user")
            .map(|json| serde_json::from_str::<TelegramUser>(json))
            .transpose()?;

        let auth_date = fields
            .get("auth_date")
            .map(|s| {
                s.parse::<i64>()
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .ok_or_else(|| IdentityError::MalformedField {
                        field: "auth_date".into(),
                    })
            })
            .transpose()?;

        Ok(Self {
            query_id: fields.get("query_id").cloned(),
            user,
            auth_date,
            hash: fields.get("hash").cloned(),
            fields,
        })
    }

    /// Parse and verify the signature and freshness against `now`.
    pub fn verify(
        raw: &str,
        bot_token: &SecretString,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, IdentityError> {
        let data = Self::parse(raw)?;
        let received = data.hash.as_deref().ok_or(IdentityError::MissingHash)?;
        let tag = hex::decode(received).map_err(|_| IdentityError::InvalidSignature)?;
        mac(&data.data_check_string(), bot_token.expose_secret())
            .verify_slice(&tag)
            .map_err(|_| IdentityError::InvalidSignature)?;

        let auth_date = data.auth_date.ok_or_else(|| IdentityError::MalformedField {
            field: "auth_date".into(),
        })?;
        let age_secs = (now - auth_date).num_seconds();
        if age_secs > max_age.as_secs() as i64 {
            return Err(IdentityError::Expired { age_secs });
        }

        Ok(data)
    }

    /// The string Telegram signs.
    pub fn data_check_string(&self) -> String {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != "hash")
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Hex signature of this data under `bot_token`.
    pub fn signature(&self, bot_token: &SecretString) -> String {
        sign(&self.data_check_string(), bot_token.expose_secret())
    }
}

fn sign(data_check_string: &str, bot_token: &str) -> String {
    hex::encode(mac(data_check_string, bot_token).finalize().into_bytes())
}

/// The init data MAC, fed with `data_check_string` and ready to finalize or
/// verify.
fn mac(data_check_string: &str, bot_token: &str) -> HmacSha256 {
    let mut secret_mac =
        HmacSha256::new_from_slice(b"WebAppData").expect("HMAC can take key of any size");
    secret_mac.update(bot_token.as_bytes());
    let secret = secret_mac.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret).expect("HMAC can take key of any size");
    mac.update(data_check_string.as_bytes());
    mac
}
