//! Identity resolution: who is using the app.
//!
//! A provider supplies the user (from the host, or a local stub); the
//! resolver writes a bootstrap profile and moves on to the registration
//! screen.

pub mod model;
pub mod provider;
pub mod resolver;

use url::Url;

use crate::host::InitData;

pub use model::{IdentitySource, TelegramUser, UserIdentity};
pub use provider::{IdentityProvider, LocalProvider, TelegramProvider};
pub use resolver::{IdentityResolver, NavigationPolicy, Resolution};

/// The context the app was opened in.
#[derive(Debug, Clone)]
pub enum HostEnvironment {
    /// Served from localhost; use the local stub.
    Local,
    /// Opened inside Telegram with init data.
    Telegram(InitData),
    /// Neither; identity cannot be resolved.
    Detached,
}

impl HostEnvironment {
    pub fn detect(app_url: &Url, init_data: Option<InitData>) -> Self {
        let local = matches!(app_url.host_str(), Some("localhost") | Some("127.0.0.1"));
        match (local, init_data) {
            (true, _) => Self::Local,
            (false, Some(data)) => Self::Telegram(data),
            (false, None) => Self::Detached,
        }
    }
}
