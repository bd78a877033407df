//! Integration tests for identity resolution and the bootstrap profile write.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;

use nova_register::error::{IdentityError, LocationError, StoreError};
use nova_register::host::{
    InitData, InitDataWebApp, LocationManager, StaticLocationManager, WebApp,
};
use nova_register::identity::{
    HostEnvironment, IdentityProvider, IdentityResolver, IdentitySource, LocalProvider,
    NavigationPolicy, Resolution, TelegramProvider, TelegramUser,
};
use nova_register::location::{Coordinate, HostLocator, LocationSource, TASHKENT};
use nova_register::navigation::{Navigator, Route};
use nova_register::store::model::{FALLBACK_PHONE, FALLBACK_USERNAME};
use nova_register::store::{MemoryStore, ProfileRecord, ProfileStore};

const BOT_TOKEN: &str = "123456:TEST-TOKEN";

const USER_JSON: &str = r#"{"id":987654321,"first_name":"Dilnoza","language_code":"en"}"#;

// ── Fakes ───────────────────────────────────────────────────────────────

/// Records each navigation together with how many writes the store had
/// seen at that moment.
struct RecordingNavigator {
    store: Arc<MemoryStore>,
    calls: Mutex<Vec<(Route, usize)>>,
}

impl RecordingNavigator {
    fn new(store: Arc<MemoryStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(Route, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        let writes = self.store.write_count();
        self.calls.lock().unwrap().push((route, writes));
    }
}

/// Host client with no user that counts lifecycle calls.
#[derive(Default)]
struct CountingHost {
    ready: AtomicUsize,
    expand: AtomicUsize,
    alerts: AtomicUsize,
}

impl WebApp for CountingHost {
    fn ready(&self) {
        self.ready.fetch_add(1, Ordering::SeqCst);
    }
    fn expand(&self) {
        self.expand.fetch_add(1, Ordering::SeqCst);
    }
    fn user(&self) -> Option<TelegramUser> {
        None
    }
    fn location_manager(&self) -> Option<&dyn LocationManager> {
        None
    }
    fn show_alert(&self, _message: &str) {
        self.alerts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Store whose writes always fail; reads see nothing.
struct DownStore {
    writes: AtomicUsize,
}

#[async_trait]
impl ProfileStore for DownStore {
    async fn upsert(&self, _record: &ProfileRecord) -> Result<ProfileRecord, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Request("connection refused".into()))
    }
    async fn insert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError> {
        self.upsert(record).await
    }
    async fn get(&self, _id: &str) -> Result<Option<ProfileRecord>, StoreError> {
        Ok(None)
    }
}

/// Navigator that only counts.
#[derive(Default)]
struct CountingNavigator {
    calls: AtomicUsize,
}

impl Navigator for CountingNavigator {
    fn navigate(&self, _route: Route) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// A signed init data query string.
fn signed_init_data(pairs: &[(&str, &str)]) -> String {
    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        ser.append_pair(k, v);
    }
    let unsigned = ser.finish();
    let hash = InitData::parse(&unsigned)
        .unwrap()
        .signature(&SecretString::from(BOT_TOKEN));
    format!("{unsigned}&hash={hash}")
}

fn fresh_auth_date() -> String {
    Utc::now().timestamp().to_string()
}

fn telegram_host(raw: &str) -> Arc<dyn WebApp> {
    let data = InitData::verify(
        raw,
        &SecretString::from(BOT_TOKEN),
        nova_register::host::init_data::DEFAULT_MAX_AGE,
        Utc::now(),
    )
    .unwrap();
    Arc::new(InitDataWebApp::new(data))
}

// ── Local stub ──────────────────────────────────────────────────────────

#[tokio::test]
async fn local_identity_is_written_before_navigation() {
    let store = Arc::new(MemoryStore::new());
    let navigator = RecordingNavigator::new(store.clone());
    let resolver = IdentityResolver::new(
        Arc::new(LocalProvider::new()),
        store.clone(),
        navigator.clone(),
    );

    let (identity, persisted) = match resolver.resolve().await {
        Resolution::Ready {
            identity,
            persisted,
        } => (identity, persisted),
        other => panic!("expected Ready, got {other:?}"),
    };
    assert!(persisted);
    assert!(!identity.id.is_empty());
    assert_eq!(identity.source, IdentitySource::Local);

    // Exactly one write, and it happened before the single navigation.
    assert_eq!(navigator.calls(), vec![(Route::Register, 1)]);

    let row = store.get(&identity.id).await.unwrap().unwrap();
    assert_eq!(row.username.as_deref(), Some("test_user"));
    assert_eq!(row.phone_number, "+998901234567");
    assert_eq!(row.location(), Some(TASHKENT));
    assert!(row.created_at.is_none());
}

#[tokio::test]
async fn local_runs_get_distinct_ids() {
    let a = LocalProvider::new().current_user().unwrap();
    let b = LocalProvider::new().current_user().unwrap();
    assert_ne!(a.id, b.id);
}

// ── Telegram host ───────────────────────────────────────────────────────

#[tokio::test]
async fn host_user_bootstraps_with_fallbacks() {
    let raw = signed_init_data(&[
        ("auth_date", &fresh_auth_date()),
        ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"),
        ("user", USER_JSON),
    ]);
    let store = Arc::new(MemoryStore::new());
    let navigator = RecordingNavigator::new(store.clone());
    let provider = Arc::new(TelegramProvider::new(telegram_host(&raw)));
    let resolver = IdentityResolver::new(provider, store.clone(), navigator.clone());

    let identity = resolver.resolve().await.identity().cloned().unwrap();
    assert_eq!(identity.id, "987654321");
    assert_eq!(identity.source, IdentitySource::Host);
    assert_eq!(navigator.calls(), vec![(Route::Register, 1)]);

    let row = store.get("987654321").await.unwrap().unwrap();
    assert_eq!(row.telegram_id, Some(987654321));
    assert_eq!(row.username.as_deref(), Some(FALLBACK_USERNAME));
    assert_eq!(row.phone_number, FALLBACK_PHONE);
    assert_eq!(row.first_name.as_deref(), Some("Dilnoza"));
    assert_eq!(row.language_code, "en");
    assert_eq!(row.location(), None);
}

#[tokio::test]
async fn host_without_user_does_nothing() {
    let store = Arc::new(MemoryStore::new());
    let navigator = RecordingNavigator::new(store.clone());
    let host = Arc::new(CountingHost::default());
    let resolver = IdentityResolver::new(
        Arc::new(TelegramProvider::new(host.clone())),
        store.clone(),
        navigator.clone(),
    );

    assert_eq!(resolver.resolve().await, Resolution::Unresolved);
    assert!(navigator.calls().is_empty());
    assert_eq!(store.write_count(), 0);
    assert_eq!(host.alerts.load(Ordering::SeqCst), 0);
    // The host is still told the app loaded.
    assert_eq!(host.ready.load(Ordering::SeqCst), 1);
    assert_eq!(host.expand.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn write_failure_still_navigates_by_default() {
    let store = Arc::new(DownStore {
        writes: AtomicUsize::new(0),
    });
    let navigator = Arc::new(CountingNavigator::default());
    let resolver = IdentityResolver::new(
        Arc::new(LocalProvider::with_id("fake-user-123")),
        store.clone(),
        navigator.clone(),
    );

    let resolution = resolver.resolve().await;
    assert!(matches!(
        resolution,
        Resolution::Ready {
            persisted: false,
            ..
        }
    ));
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    assert_eq!(navigator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn confirmed_write_policy_holds_on_failure() {
    let store = Arc::new(DownStore {
        writes: AtomicUsize::new(0),
    });
    let navigator = Arc::new(CountingNavigator::default());
    let resolver = IdentityResolver::new(
        Arc::new(LocalProvider::with_id("fake-user-123")),
        store,
        navigator.clone(),
    )
    .with_policy(NavigationPolicy::ConfirmedWrite);

    let resolution = resolver.resolve().await;
    assert!(matches!(resolution, Resolution::Pending { .. }));
    assert_eq!(navigator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn host_bootstrap_keeps_registered_location() {
    let raw = signed_init_data(&[("auth_date", &fresh_auth_date()), ("user", USER_JSON)]);
    let provider = Arc::new(TelegramProvider::new(telegram_host(&raw)));
    let identity = provider.current_user().unwrap();

    let store = Arc::new(MemoryStore::new());
    let samarkand = Coordinate::new(39.6542, 66.9597);
    store
        .upsert(&ProfileRecord::registration(
            &identity,
            "+998935554433",
            samarkand,
            Utc::now(),
        ))
        .await
        .unwrap();

    // A later launch re-runs the bootstrap upsert, which carries no location.
    let navigator = Arc::new(CountingNavigator::default());
    IdentityResolver::new(provider, store.clone(), navigator)
        .resolve()
        .await;

    let row = store.get(&identity.id).await.unwrap().unwrap();
    assert_eq!(row.location(), Some(samarkand));
    assert!(row.created_at.is_some());
    assert_eq!(row.phone_number, "+998935554433");
}

#[tokio::test]
async fn first_bootstrap_writes_fallback_phone() {
    let raw = signed_init_data(&[("auth_date", &fresh_auth_date()), ("user", USER_JSON)]);
    let provider = Arc::new(TelegramProvider::new(telegram_host(&raw)));
    let store = Arc::new(MemoryStore::new());

    let resolution = IdentityResolver::new(
        provider,
        store.clone(),
        Arc::new(CountingNavigator::default()),
    )
    .resolve()
    .await;

    let row = store.get("987654321").await.unwrap().unwrap();
    assert_eq!(row.phone_number, FALLBACK_PHONE);
    assert!(matches!(resolution, Resolution::Ready { persisted: true, .. }));
}

// ── Environment detection and init data ─────────────────────────────────

#[test]
fn environment_detection() {
    let deployed = url::Url::parse("https://nova.example.uz/").unwrap();
    let raw = signed_init_data(&[("auth_date", &fresh_auth_date()), ("user", USER_JSON)]);
    let data = InitData::parse(&raw).unwrap();
    assert!(matches!(
        HostEnvironment::detect(&deployed, Some(data)),
        HostEnvironment::Telegram(_)
    ));
    assert!(matches!(
        HostEnvironment::detect(&deployed, None),
        HostEnvironment::Detached
    ));
}

#[test]
fn tampered_init_data_is_rejected() {
    let raw = signed_init_data(&[("auth_date", &fresh_auth_date()), ("user", USER_JSON)]);
    let tampered = raw.replace("Dilnoza", "Mallory");
    let err = InitData::verify(
        &tampered,
        &SecretString::from(BOT_TOKEN),
        nova_register::host::init_data::DEFAULT_MAX_AGE,
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, IdentityError::InvalidSignature));
}

// ── Host location strategy ──────────────────────────────────────────────

#[tokio::test]
async fn host_location_inside_uzbekistan_is_accepted() {
    let raw = signed_init_data(&[("auth_date", &fresh_auth_date()), ("user", USER_JSON)]);
    let data = InitData::parse(&raw).unwrap();
    let host: Arc<dyn WebApp> = Arc::new(
        InitDataWebApp::new(data)
            .with_location_manager(Box::new(StaticLocationManager::new(Some(TASHKENT)))),
    );
    let locator = HostLocator::new(Arc::new(TelegramProvider::new(host)));
    assert_eq!(locator.locate().await, Ok(TASHKENT));
}

#[tokio::test]
async fn host_location_outside_uzbekistan_is_rejected() {
    let raw = signed_init_data(&[("auth_date", &fresh_auth_date()), ("user", USER_JSON)]);
    let data = InitData::parse(&raw).unwrap();
    let moscow = Coordinate::new(55.7558, 37.6173);
    let host: Arc<dyn WebApp> = Arc::new(
        InitDataWebApp::new(data)
            .with_location_manager(Box::new(StaticLocationManager::new(Some(moscow)))),
    );
    let locator = HostLocator::new(Arc::new(TelegramProvider::new(host)));
    assert!(matches!(
        locator.locate().await,
        Err(LocationError::OutOfBounds { .. })
    ));
}
