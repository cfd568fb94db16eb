use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// Export modules
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod guards;
pub mod http;
pub mod navigation;
pub mod notify;
pub mod session;
pub mod storage;
pub mod token;

pub use auth::AuthClient;
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::ApiError;
pub use guards::{AdminGuard, AuthGuard, MaintenanceGuard, RouteGuard};
pub use http::{ApiClient, HttpClient, MaintenanceClient, MaintenanceGate, ReqwestHttpClient};
pub use navigation::{Navigator, Route};
pub use notify::{SessionNotifier, TracingNotifier};
pub use session::{AuthState, LogoutReason, Role, SessionMonitor, SessionService, SessionStore, User};
pub use storage::{JsonFileStorage, MemoryStorage, SessionStorage};

use http::authenticator::RequestAuthenticator;

/// Initialize tracing with an env-filter, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// The fully wired control plane.
///
/// Owns the session store, the request pipeline, the auth client, the
/// monitor-driving service, and the three navigation guards. Embedders hand
/// in the boundary collaborators (transport, storage, router, notifier) and
/// get back one explicitly constructed service graph instead of process-wide
/// singletons.
pub struct ControlPlane {
    pub store: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthClient>,
    pub service: Arc<SessionService>,
    pub auth_guard: Arc<AuthGuard>,
    pub admin_guard: Arc<AdminGuard>,
    pub maintenance_guard: Arc<MaintenanceGuard>,
}

impl ControlPlane {
    /// Wire every component against the given boundary collaborators and
    /// restore any persisted session.
    pub async fn build(
        config: Config,
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn SessionNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let store = Arc::new(SessionStore::open(storage, config.storage.clone()).await?);

        let authenticator = RequestAuthenticator::new(
            Arc::clone(&store),
            Arc::clone(&navigator),
            Arc::clone(&notifier),
            Arc::clone(&clock),
            config.endpoints.unauthenticated(),
        );
        let gate = MaintenanceGate::new(Arc::clone(&navigator));
        let api = Arc::new(ApiClient::new(
            Arc::clone(&http),
            config.base_url.clone(),
            gate,
            authenticator,
        ));

        let auth = Arc::new(AuthClient::new(
            Arc::clone(&api),
            Arc::clone(&store),
            config.endpoints.clone(),
        ));

        let monitor = Arc::new(SessionMonitor::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&navigator),
            Arc::clone(&notifier),
            &config.monitor,
        ));
        let service = Arc::new(SessionService::new(
            Arc::clone(&store),
            monitor,
            Arc::clone(&navigator),
            Arc::clone(&notifier),
        ));

        let maintenance_status = Arc::new(MaintenanceClient::new(
            Arc::clone(&http),
            &config.base_url,
            &config.endpoints.maintenance_status,
        ));

        let auth_guard = Arc::new(AuthGuard::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&navigator),
        ));
        let admin_guard = Arc::new(AdminGuard::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&navigator),
        ));
        let maintenance_guard = Arc::new(MaintenanceGuard::new(
            Arc::clone(&store),
            maintenance_status,
            Arc::clone(&navigator),
        ));

        Ok(Self {
            store,
            api,
            auth,
            service,
            auth_guard,
            admin_guard,
            maintenance_guard,
        })
    }
}
