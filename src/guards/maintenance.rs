use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::guards::RouteGuard;
use crate::http::maintenance::MaintenanceClient;
use crate::navigation::{Navigator, Route};
use crate::session::store::SessionStore;

/// Guard that keeps non-admin users out while maintenance mode is enabled.
///
/// Admins bypass the check unconditionally. For everyone else the status is
/// fetched remotely; a failing status check passes the guard rather than
/// locking every user out over a transient lookup error
/// (availability over strictness).
pub struct MaintenanceGuard {
    store: Arc<SessionStore>,
    status: Arc<MaintenanceClient>,
    navigator: Arc<dyn Navigator>,
}

impl MaintenanceGuard {
    pub fn new(
        store: Arc<SessionStore>,
        status: Arc<MaintenanceClient>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            status,
            navigator,
        }
    }
}

#[async_trait]
impl RouteGuard for MaintenanceGuard {
    async fn can_activate(&self) -> bool {
        let state = self.store.get();
        if state.user().is_some_and(|user| user.is_admin()) {
            debug!("admin bypasses maintenance mode");
            return true;
        }

        match self.status.is_enabled().await {
            Ok(true) => {
                debug!("maintenance mode enabled, redirecting");
                self.navigator.navigate(Route::Maintenance);
                false
            }
            Ok(false) => true,
            Err(e) => {
                warn!(error = %e, "maintenance status check failed, failing open");
                true
            }
        }
    }
}
