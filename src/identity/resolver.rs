//! Identity resolution. Runs once when the entry screen mounts.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::model::UserIdentity;
use super::provider::IdentityProvider;
use crate::error::ConfigError;
use crate::navigation::{Navigator, Route};
use crate::store::{ProfileRecord, ProfileStore};

/// When to leave the entry screen after the bootstrap write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationPolicy {
    /// Navigate whether or not the bootstrap write succeeded.
    #[default]
    Always,
    /// Navigate only after the bootstrap write succeeded.
    ConfirmedWrite,
}

impl FromStr for NavigationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "confirmed" | "confirmed_write" => Ok(Self::ConfirmedWrite),
            other => Err(ConfigError::InvalidValue {
                key: "NOVA_NAVIGATION_POLICY".into(),
                message: format!("expected `always` or `confirmed`, got `{other}`"),
            }),
        }
    }
}

/// Outcome of [`IdentityResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Identity resolved and the app moved to the registration route.
    Ready {
        identity: UserIdentity,
        persisted: bool,
    },
    /// Identity resolved but the write failed and the policy requires a
    /// confirmed write. The app stays on the entry screen.
    Pending { identity: UserIdentity },
    /// No user context. Nothing was written and nothing is shown.
    Unresolved,
}

impl Resolution {
    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            Self::Ready { identity, .. } | Self::Pending { identity } => Some(identity),
            Self::Unresolved => None,
        }
    }
}

/// Determines the acting user, writes the bootstrap profile, and navigates.
pub struct IdentityResolver {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn ProfileStore>,
    navigator: Arc<dyn Navigator>,
    policy: NavigationPolicy,
}

impl IdentityResolver {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn ProfileStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            provider,
            store,
            navigator,
            policy: NavigationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: NavigationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve the identity. The bootstrap write always finishes before any
    /// navigation happens.
    pub async fn resolve(&self) -> Resolution {
        self.provider.prepare();

        let Some(identity) = self.provider.current_user() else {
            warn!(provider = self.provider.name(), "No user context; staying on entry screen");
            return Resolution::Unresolved;
        };

        let persisted = self.write_bootstrap(&identity).await;

        if !persisted && self.policy == NavigationPolicy::ConfirmedWrite {
            warn!(user_id = %identity.id, "Bootstrap write unconfirmed; not navigating");
            return Resolution::Pending { identity };
        }

        info!(user_id = %identity.id, route = %Route::Register, "User ready");
        self.navigator.navigate(Route::Register);
        Resolution::Ready {
            identity,
            persisted,
        }
    }

    /// Upsert the bootstrap profile. A phone already stored for the user is
    /// carried over, so the placeholder only ever lands on a new row.
    async fn write_bootstrap(&self, identity: &UserIdentity) -> bool {
        let mut record = ProfileRecord::bootstrap(identity, self.provider.default_location());
        match self.store.get(&identity.id).await {
            Ok(Some(existing)) => record.phone_number = existing.phone_number,
            Ok(None) => {}
            Err(e) => {
                error!(user_id = %identity.id, error = %e, "Failed to read existing profile");
                return false;
            }
        }

        match self.store.upsert(&record).await {
            Ok(_) => {
                info!(user_id = %identity.id, source = %identity.source, "Bootstrap profile saved");
                true
            }
            Err(e) => {
                error!(user_id = %identity.id, error = %e, "Failed to save bootstrap profile");
                false
            }
        }
    }
}
