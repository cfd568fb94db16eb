use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::info;

use crate::http::client::HttpClient;
use crate::navigation::{Navigator, Route};

/// Pipeline stage that watches for service-unavailable responses.
///
/// Runs on every response regardless of authentication state, never touches
/// the session store, and is independent of the authenticator's 401/403
/// handling.
pub struct MaintenanceGate {
    navigator: Arc<dyn Navigator>,
}

impl MaintenanceGate {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }

    /// Redirect to the maintenance view on 503, unless already there.
    pub fn on_response(&self, status: u16) {
        if status == 503 && self.navigator.current() != Route::Maintenance {
            info!("service unavailable, redirecting to maintenance view");
            self.navigator.navigate(Route::Maintenance);
        }
    }
}

#[derive(Debug, Deserialize)]
struct MaintenanceStatus {
    enabled: bool,
}

/// Remote check of maintenance-mode status.
///
/// Calls the settings endpoint without credentials; the endpoint must be
/// reachable by unauthenticated clients.
pub struct MaintenanceClient {
    http: Arc<dyn HttpClient>,
    url: String,
}

impl MaintenanceClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str, status_path: &str) -> Self {
        Self {
            http,
            url: format!("{base_url}{status_path}"),
        }
    }

    /// Whether maintenance mode is currently enabled.
    pub async fn is_enabled(&self) -> Result<bool> {
        let response = self.http.get(&self.url, HashMap::new()).await?;
        if !response.is_success() {
            return Err(anyhow!(
                "maintenance status check failed with status {}",
                response.status()
            ));
        }
        let status: MaintenanceStatus = response.json()?;
        Ok(status.enabled)
    }
}
