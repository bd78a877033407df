use std::sync::Arc;

use nova_register::config::AppConfig;
use nova_register::console::{ConsoleNavigator, run_form};
use nova_register::host::{InitData, InitDataWebApp, StaticLocationManager, WebApp};
use nova_register::identity::{
    HostEnvironment, IdentityProvider, IdentityResolver, LocalProvider, Resolution,
    TelegramProvider,
};
use nova_register::location::{
    BrowserLocator, FixedGeolocation, Geolocation, HostLocator, LocationSource, LocationStrategy,
};
use nova_register::registration::RegistrationForm;
use nova_register::store::{MemoryStore, ProfileStore, SupabaseStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    eprintln!("Nova Register v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   App URL: {}", config.app_url);

    // ── Store ───────────────────────────────────────────────────────────
    let store: Arc<dyn ProfileStore> = match &config.supabase {
        Some(supabase) => {
            eprintln!("   Store: {}/rest/v1/{}", supabase.url, supabase.table);
            Arc::new(SupabaseStore::new(supabase.clone()))
        }
        None => {
            eprintln!("   Store: in-memory (SUPABASE_URL not set)");
            Arc::new(MemoryStore::new())
        }
    };

    // ── Host environment ────────────────────────────────────────────────
    let init_data = match (&config.init_data, &config.bot_token) {
        (Some(raw), Some(token)) => Some(InitData::verify(
            raw,
            token,
            config.init_data_max_age,
            chrono::Utc::now(),
        )?),
        (Some(raw), None) => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set; init data is not verified");
            Some(InitData::parse(raw)?)
        }
        (None, _) => None,
    };

    let (provider, host): (Arc<dyn IdentityProvider>, Option<Arc<dyn WebApp>>) =
        match HostEnvironment::detect(&config.app_url, init_data) {
            HostEnvironment::Local => {
                let provider = match config.dev_position {
                    Some(position) => LocalProvider::new().with_location(position),
                    None => LocalProvider::new(),
                };
                (Arc::new(provider), None)
            }
            HostEnvironment::Telegram(data) => {
                let web_app: Arc<dyn WebApp> = Arc::new(
                    InitDataWebApp::new(data).with_location_manager(Box::new(
                        StaticLocationManager::new(config.dev_position),
                    )),
                );
                (
                    Arc::new(TelegramProvider::new(Arc::clone(&web_app))),
                    Some(web_app),
                )
            }
            HostEnvironment::Detached => {
                tracing::warn!(
                    app_url = %config.app_url,
                    "Not running inside Telegram and not on localhost; nothing to do"
                );
                return Ok(());
            }
        };
    eprintln!("   Identity: {}", provider.name());

    // ── Identity resolution ─────────────────────────────────────────────
    let navigator = Arc::new(ConsoleNavigator::new());
    let resolver = IdentityResolver::new(Arc::clone(&provider), Arc::clone(&store), navigator)
        .with_policy(config.navigation_policy);

    let identity = match resolver.resolve().await {
        Resolution::Ready { identity, .. } => identity,
        Resolution::Pending { identity } => {
            eprintln!("Could not save a profile for {}; staying on /", identity.id);
            return Ok(());
        }
        Resolution::Unresolved => return Ok(()),
    };

    // ── Registration form ───────────────────────────────────────────────
    let locator: Arc<dyn LocationSource> = match config.location_strategy {
        LocationStrategy::Browser => {
            let position = config.dev_position.or_else(|| provider.default_location());
            let geolocation: Arc<dyn Geolocation> = Arc::new(FixedGeolocation::new(position));
            Arc::new(BrowserLocator::new(Some(geolocation)))
        }
        LocationStrategy::Host => Arc::new(HostLocator::new(Arc::clone(&provider))),
    };
    eprintln!("   Location: {}\n", locator.name());

    let mut form = RegistrationForm::new(identity, store, locator, config.form.clone());
    if let Some(host) = host {
        form = form.with_host(host);
    }

    run_form(&form).await;
    Ok(())
}
