//! Nova Register: the Telegram Mini App registration flow.
//!
//! Resolves the launching user, writes a bootstrap profile, then collects
//! a phone number and location and writes the completed profile.

pub mod config;
pub mod console;
pub mod error;
pub mod host;
pub mod i18n;
pub mod identity;
pub mod location;
pub mod navigation;
pub mod registration;
pub mod store;
