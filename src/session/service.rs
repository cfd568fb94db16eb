use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::navigation::{Navigator, Route};
use crate::notify::SessionNotifier;
use crate::session::monitor::SessionMonitor;
use crate::session::store::SessionStore;
use crate::session::LogoutReason;

/// Couples the session store to the monitor's state machine.
///
/// Watches store transitions: an authenticated state starts the monitor, an
/// unauthenticated one stops it. Login succeeding, logout of any reason, and
/// restoration from storage all flow through the same subscription, so the
/// monitor never needs to be driven by hand.
pub struct SessionService {
    store: Arc<SessionStore>,
    monitor: Arc<SessionMonitor>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn SessionNotifier>,
    task: RwLock<Option<JoinHandle<()>>>,
}

impl SessionService {
    pub fn new(
        store: Arc<SessionStore>,
        monitor: Arc<SessionMonitor>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> Self {
        Self {
            store,
            monitor,
            navigator,
            notifier,
            task: RwLock::new(None),
        }
    }

    /// Begin following store transitions. The current state is acted on
    /// immediately, so a session restored from storage starts its monitor
    /// without waiting for a transition.
    pub async fn start(&self) {
        if let Some(handle) = self.task.write().await.take() {
            handle.abort();
        }

        let store = Arc::clone(&self.store);
        let monitor = Arc::clone(&self.monitor);
        let handle = tokio::spawn(async move {
            let mut rx = store.subscribe();
            loop {
                let authenticated = rx.borrow_and_update().is_authenticated();
                if authenticated {
                    monitor.start().await;
                } else {
                    monitor.stop().await;
                }
                if rx.changed().await.is_err() {
                    debug!("session store dropped, stopping service loop");
                    break;
                }
            }
        });
        *self.task.write().await = Some(handle);
        info!("session service started");
    }

    /// Manual logout: clear the session, notify, return to the login view.
    pub async fn logout(&self) -> Result<()> {
        let was_authenticated = self.store.get().is_authenticated();
        self.store.clear().await?;
        if was_authenticated {
            self.notifier.session_ended(LogoutReason::Manual);
            self.navigator.navigate(Route::Login);
        }
        Ok(())
    }

    /// Stop following transitions and cancel the monitor.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.task.write().await.take() {
            handle.abort();
        }
        self.monitor.stop().await;
        info!("session service stopped");
    }
}
