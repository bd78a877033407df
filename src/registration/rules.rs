//! Submit-time validation as an ordered rule list. First failure wins.

use std::str::FromStr;

use tracing::debug;

use super::phone::{is_complete_phone, matches_phone_pattern};
use super::state::FormState;
use crate::error::ConfigError;
use crate::i18n::UserMessage;

/// Which rule rejected the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationFailure {
    IncompletePhone,
    LocationRequired,
}

impl ValidationFailure {
    pub fn user_message(self) -> UserMessage {
        match self {
            Self::IncompletePhone => UserMessage::PhoneIncomplete,
            Self::LocationRequired => UserMessage::LocationRequired,
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompletePhone => write!(f, "incomplete phone number"),
            Self::LocationRequired => write!(f, "location required"),
        }
    }
}

/// How the phone rule decides completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhoneCheck {
    /// Exactly 13 characters.
    #[default]
    Length,
    /// `^\+998\d{9}$`.
    Pattern,
}

impl FromStr for PhoneCheck {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "length" => Ok(Self::Length),
            "pattern" => Ok(Self::Pattern),
            other => Err(ConfigError::InvalidValue {
                key: "NOVA_PHONE_CHECK".into(),
                message: format!("expected `length` or `pattern`, got `{other}`"),
            }),
        }
    }
}

/// One validation rule: passes when `check` returns true.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub name: &'static str,
    pub check: fn(&FormState) -> bool,
    pub failure: ValidationFailure,
}

/// Ordered validation rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ValidationRule>,
}

impl RuleSet {
    /// Phone first, then location.
    pub fn default_rules(phone_check: PhoneCheck) -> Self {
        let phone_rule = match phone_check {
            PhoneCheck::Length => ValidationRule {
                name: "phone_length",
                check: |state| is_complete_phone(&state.phone_number),
                failure: ValidationFailure::IncompletePhone,
            },
            PhoneCheck::Pattern => ValidationRule {
                name: "phone_pattern",
                check: |state| matches_phone_pattern(&state.phone_number),
                failure: ValidationFailure::IncompletePhone,
            },
        };
        let location_rule = ValidationRule {
            name: "location_set",
            check: |state| state.location.is_some(),
            failure: ValidationFailure::LocationRequired,
        };

        Self {
            rules: vec![phone_rule, location_rule],
        }
    }

    /// A rule set with no rules (for testing).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn push(&mut self, rule: ValidationRule) {
        self.rules.push(rule);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Run the rules in order and stop at the first failure.
    pub fn evaluate(&self, state: &FormState) -> Result<(), ValidationFailure> {
        for rule in &self.rules {
            if !(rule.check)(state) {
                debug!(rule = rule.name, "Validation rule failed");
                return Err(rule.failure);
            }
        }
        Ok(())
    }
}
