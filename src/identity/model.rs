//! Identity data models.

use serde::{Deserialize, Serialize};

use crate::i18n::Locale;

/// Language assumed when the host does not report one.
pub const DEFAULT_LANGUAGE_CODE: &str = "uz";

/// The user object Telegram embeds in init data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Only present when the user shared their contact with the bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Where an identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// Supplied by the embedding host.
    Host,
    /// Synthesized for a local/test run.
    Local,
}

impl std::fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// The acting user for this session. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub photo_url: Option<String>,
    pub language_code: String,
    pub telegram_id: Option<i64>,
    pub source: IdentitySource,
}

impl UserIdentity {
    pub fn locale(&self) -> Locale {
        Locale::from_language_code(&self.language_code)
    }

    /// First name, then `@username`, then the raw id.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.username) {
            (Some(first), _) => match &self.last_name {
                Some(last) => format!("{first} {last}"),
                None => first.clone(),
            },
            (None, Some(username)) => format!("@{username}"),
            (None, None) => self.id.clone(),
        }
    }
}

impl From<TelegramUser> for UserIdentity {
    fn from(user: TelegramUser) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            photo_url: user.photo_url,
            language_code: user
                .language_code
                .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string()),
            telegram_id: Some(user.id),
            source: IdentitySource::Host,
        }
    }
}
