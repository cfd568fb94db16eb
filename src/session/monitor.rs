use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::navigation::{Navigator, Route};
use crate::notify::SessionNotifier;
use crate::session::store::SessionStore;
use crate::session::LogoutReason;
use crate::token;

/// Outcome of a single expiry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCheck {
    /// No authenticated session to watch
    NoSession,
    /// Token valid and outside the warning window
    Valid,
    /// Warning shown with this many whole minutes remaining
    Warned(i64),
    /// Token expired; the session was ended
    Expired,
}

/// Periodic watcher over the current token's expiry claim.
///
/// A two-state machine: idle (no timer) and watching (one periodic timer
/// alive). Expiry has no server push; wall-clock time against the claim baked
/// into the token is the only authoritative signal, so this polls.
pub struct SessionMonitor {
    store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn SessionNotifier>,
    warning_threshold: ChronoDuration,
    check_interval: Duration,
    /// One warning per session; reset every time watching begins.
    warning_shown: AtomicBool,
    timer: RwLock<Option<JoinHandle<()>>>,
}

impl SessionMonitor {
    pub fn new(
        store: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn SessionNotifier>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            store,
            clock,
            navigator,
            notifier,
            warning_threshold: ChronoDuration::seconds(config.warning_threshold_secs as i64),
            check_interval: Duration::from_secs(config.check_interval_secs),
            warning_shown: AtomicBool::new(false),
            timer: RwLock::new(None),
        }
    }

    /// Transition idle → watching.
    ///
    /// Any existing timer is cancelled first so at most one periodic check is
    /// ever alive, the warning flag is reset, and an immediate check runs
    /// before the first tick: a session restored from storage that is already
    /// inside the warning window is caught without waiting a full period.
    pub async fn start(self: &Arc<Self>) {
        self.stop().await;
        self.warning_shown.store(false, Ordering::SeqCst);

        debug!("session monitor watching");
        if self.check_now().await == MonitorCheck::Expired {
            return;
        }

        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.check_interval);
            // The first tick of a fresh interval completes immediately and
            // would duplicate the check that already ran above.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if monitor.check_now().await == MonitorCheck::Expired {
                    break;
                }
            }
        });
        *self.timer.write().await = Some(handle);
    }

    /// Transition watching → idle. Idempotent.
    pub async fn stop(&self) {
        if let Some(handle) = self.timer.write().await.take() {
            handle.abort();
            debug!("session monitor idle");
        }
    }

    /// Whether a periodic timer is currently alive.
    pub async fn is_watching(&self) -> bool {
        self.timer
            .read()
            .await
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Recompute time-until-expiry from the current token and act on it.
    ///
    /// Exposed so tests can drive the state machine with a manual clock
    /// instead of waiting out real tick periods.
    pub async fn check_now(&self) -> MonitorCheck {
        let state = self.store.get();
        let Some(current) = state.token().map(str::to_owned) else {
            return MonitorCheck::NoSession;
        };

        match token::time_until_expiry(&current, self.clock.now()) {
            None => {
                info!("token expired, ending session");
                self.force_expired_logout().await;
                MonitorCheck::Expired
            }
            Some(remaining) if remaining <= self.warning_threshold => {
                if self.warning_shown.swap(true, Ordering::SeqCst) {
                    return MonitorCheck::Valid;
                }
                let minutes_left = remaining.num_minutes();
                warn!(minutes_left, "token expires soon, warning once");
                self.notifier.expiry_warning(minutes_left);
                MonitorCheck::Warned(minutes_left)
            }
            Some(_) => MonitorCheck::Valid,
        }
    }

    async fn force_expired_logout(&self) {
        if let Err(e) = self.store.clear().await {
            error!(error = %e, "failed to clear expired session");
        }
        self.notifier.session_ended(LogoutReason::Expired);
        self.navigator.navigate(Route::Login);
    }
}
