//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::ConfigError;
use crate::host::init_data::DEFAULT_MAX_AGE;
use crate::identity::NavigationPolicy;
use crate::location::{Coordinate, LocationStrategy};
use crate::registration::{DEFAULT_RESET_DELAY, FormConfig, PhoneCheck, SubmitMode};
use crate::store::SupabaseConfig;

/// Page URL assumed when none is configured.
pub const DEFAULT_APP_URL: &str = "http://localhost:5173";
/// Table profiles are written to.
pub const DEFAULT_PROFILES_TABLE: &str = "profiles";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// URL the app is served from; a localhost URL selects the local stub.
    pub app_url: Url,
    /// Raw Telegram init data query string.
    pub init_data: Option<String>,
    /// Bot token for verifying init data. Unverified when unset.
    pub bot_token: Option<SecretString>,
    /// Oldest init data accepted.
    pub init_data_max_age: Duration,
    /// Remote store; `None` uses the in-process store.
    pub supabase: Option<SupabaseConfig>,
    pub location_strategy: LocationStrategy,
    /// Position served by development geolocation and the static host
    /// location manager.
    pub dev_position: Option<Coordinate>,
    pub navigation_policy: NavigationPolicy,
    pub form: FormConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_url: Url::parse(DEFAULT_APP_URL).expect("default app URL is valid"),
            init_data: None,
            bot_token: None,
            init_data_max_age: DEFAULT_MAX_AGE,
            supabase: None,
            location_strategy: LocationStrategy::default(),
            dev_position: None,
            navigation_policy: NavigationPolicy::default(),
            form: FormConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset or blank values fall back to
    /// defaults; values that are set but unparsable are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let app_url = match get("NOVA_APP_URL") {
            Some(raw) => Url::parse(&raw).map_err(|e| invalid("NOVA_APP_URL", e))?,
            None => Url::parse(DEFAULT_APP_URL).map_err(|e| invalid("NOVA_APP_URL", e))?,
        };

        let init_data_max_age = get("NOVA_INIT_DATA_MAX_AGE_SECS")
            .map(|s| s.parse::<u64>().map_err(|e| invalid("NOVA_INIT_DATA_MAX_AGE_SECS", e)))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_MAX_AGE);

        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(key)) => Some(SupabaseConfig {
                url,
                anon_key: SecretString::from(key),
                table: get("NOVA_PROFILES_TABLE")
                    .unwrap_or_else(|| DEFAULT_PROFILES_TABLE.to_string()),
            }),
            (Some(_), None) => {
                return Err(ConfigError::InvalidValue {
                    key: "SUPABASE_ANON_KEY".into(),
                    message: "required when SUPABASE_URL is set".into(),
                });
            }
            _ => None,
        };

        let location_strategy = get("NOVA_LOCATION_STRATEGY")
            .map(|s| s.parse::<LocationStrategy>())
            .transpose()?
            .unwrap_or_default();

        let dev_position = get("NOVA_DEV_POSITION")
            .map(|s| parse_position(&s))
            .transpose()?;

        let navigation_policy = get("NOVA_NAVIGATION_POLICY")
            .map(|s| s.parse::<NavigationPolicy>())
            .transpose()?
            .unwrap_or_default();

        let phone_check = get("NOVA_PHONE_CHECK")
            .map(|s| s.parse::<PhoneCheck>())
            .transpose()?
            .unwrap_or_default();

        let submit_mode = get("NOVA_SUBMIT_MODE")
            .map(|s| s.parse::<SubmitMode>())
            .transpose()?
            .unwrap_or_default();

        let reset_delay = match get("NOVA_RESET_DELAY_SECS") {
            Some(s) => match s.parse::<u64>().map_err(|e| invalid("NOVA_RESET_DELAY_SECS", e))? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => Some(DEFAULT_RESET_DELAY),
        };

        let notify_host = get("NOVA_NOTIFY_HOST")
            .map(|s| parse_bool("NOVA_NOTIFY_HOST", &s))
            .transpose()?
            .unwrap_or(true);

        Ok(Self {
            app_url,
            init_data: get("TELEGRAM_INIT_DATA"),
            bot_token: get("TELEGRAM_BOT_TOKEN").map(SecretString::from),
            init_data_max_age,
            supabase,
            location_strategy,
            dev_position,
            navigation_policy,
            form: FormConfig {
                phone_check,
                submit_mode,
                reset_delay,
                notify_host,
            },
        })
    }
}

fn invalid(key: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(key, format!("expected a boolean, got `{other}`"))),
    }
}

/// `"lat,lng"` in decimal degrees.
fn parse_position(raw: &str) -> Result<Coordinate, ConfigError> {
    let key = "NOVA_DEV_POSITION";
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| invalid(key, format!("expected `lat,lng`, got `{raw}`")))?;
    let lat: f64 = lat.trim().parse().map_err(|e| invalid(key, e))?;
    let lng: f64 = lng.trim().parse().map_err(|e| invalid(key, e))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(invalid(key, format!("({lat}, {lng}) is not a valid coordinate")));
    }
    Ok(Coordinate::new(lat, lng))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.app_url.as_str(), "http://localhost:5173/");
        assert!(config.init_data.is_none());
        assert!(config.bot_token.is_none());
        assert!(config.supabase.is_none());
        assert_eq!(config.init_data_max_age, Duration::from_secs(86_400));
        assert_eq!(config.location_strategy, LocationStrategy::Browser);
        assert_eq!(config.navigation_policy, NavigationPolicy::Always);
        assert_eq!(config.form, FormConfig::default());
    }

    #[test]
    fn supabase_needs_both_url_and_key() {
        let supabase = config(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap()
        .supabase
        .unwrap();
        assert_eq!(supabase.table, "profiles");
        assert_eq!(supabase.anon_key.expose_secret(), "anon");

        let err = config(&[("SUPABASE_URL", "https://abc.supabase.co")]).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn zero_reset_delay_disables_reset() {
        let config = config(&[("NOVA_RESET_DELAY_SECS", "0")]).unwrap();
        assert_eq!(config.form.reset_delay, None);
    }

    #[test]
    fn enum_values_parse() {
        let config = config(&[
            ("NOVA_LOCATION_STRATEGY", "host"),
            ("NOVA_PHONE_CHECK", "pattern"),
            ("NOVA_SUBMIT_MODE", "insert"),
            ("NOVA_NAVIGATION_POLICY", "confirmed"),
            ("NOVA_NOTIFY_HOST", "off"),
        ])
        .unwrap();
        assert_eq!(config.location_strategy, LocationStrategy::Host);
        assert_eq!(config.form.phone_check, PhoneCheck::Pattern);
        assert_eq!(config.form.submit_mode, SubmitMode::Insert);
        assert_eq!(config.navigation_policy, NavigationPolicy::ConfirmedWrite);
        assert!(!config.form.notify_host);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config(&[("NOVA_SUBMIT_MODE", "replace")]).is_err());
        assert!(config(&[("NOVA_RESET_DELAY_SECS", "soon")]).is_err());
        assert!(config(&[("NOVA_NOTIFY_HOST", "maybe")]).is_err());
        assert!(config(&[("NOVA_APP_URL", "not a url")]).is_err());
    }

    #[test]
    fn dev_position_parses() {
        let config = config(&[("NOVA_DEV_POSITION", "41.3111, 69.2401")]).unwrap();
        assert_eq!(config.dev_position, Some(Coordinate::new(41.3111, 69.2401)));
        assert!(parse_position("41.3").is_err());
        assert!(parse_position("91,0").is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config(&[("NOVA_LOCATION_STRATEGY", "  "), ("TELEGRAM_INIT_DATA", "")]).unwrap();
        assert_eq!(config.location_strategy, LocationStrategy::Browser);
        assert!(config.init_data.is_none());
    }
}
