//! Uzbek phone number input handling.
//!
//! The stored form is `+998` followed by up to 9 digits. The dashed form
//! (`+998-90-123-45-67`) is for display only.

use std::sync::LazyLock;

use regex::Regex;

/// Country prefix every value starts with.
pub const PHONE_PREFIX: &str = "+998";
/// `+998` plus 9 digits.
pub const PHONE_LENGTH: usize = 13;
/// Digit groups after the prefix.
const DISPLAY_GROUPS: [usize; 4] = [2, 3, 2, 2];

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+998\d{9}$").expect("phone pattern is valid"));

/// Clean raw input into the canonical form.
///
/// Keeps ASCII digits and a leading `+`, forces the `+998` prefix, and
/// truncates to [`PHONE_LENGTH`].
pub fn normalize_phone(raw: &str) -> String {
    let mut cleaned = String::with_capacity(PHONE_LENGTH);
    for ch in raw.chars() {
        if ch.is_ascii_digit() || (ch == '+' && cleaned.is_empty()) {
            cleaned.push(ch);
        }
    }

    if !cleaned.starts_with(PHONE_PREFIX) {
        return PHONE_PREFIX.to_string();
    }

    cleaned.truncate(PHONE_LENGTH);
    cleaned
}

/// Render a canonical value as `+998-XX-XXX-XX-XX`, grouping partial input
/// as far as it goes. Values that don't fit are returned unchanged.
pub fn format_phone_display(phone: &str) -> String {
    if phone.len() <= PHONE_PREFIX.len() {
        return phone.to_string();
    }
    let Some(rest) = phone.strip_prefix(PHONE_PREFIX) else {
        return phone.to_string();
    };
    let max_digits: usize = DISPLAY_GROUPS.iter().sum();
    if rest.len() > max_digits || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return phone.to_string();
    }

    let mut formatted = PHONE_PREFIX.to_string();
    let mut start = 0;
    for size in DISPLAY_GROUPS {
        if start >= rest.len() {
            break;
        }
        let end = (start + size).min(rest.len());
        formatted.push('-');
        formatted.push_str(&rest[start..end]);
        start = end;
    }
    formatted
}

/// Whether the value has all 9 digits.
pub fn is_complete_phone(phone: &str) -> bool {
    phone.len() == PHONE_LENGTH
}

/// Strict check: `+998` followed by exactly 9 digits.
pub fn matches_phone_pattern(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}
