use std::sync::Mutex;

use tracing::{info, warn};

use crate::session::LogoutReason;

/// Sink for user-facing session events.
///
/// The control plane never renders anything itself; the UI layer implements
/// this to show its own expiry warning and "session ended" notices.
pub trait SessionNotifier: Send + Sync {
    /// The session will expire soon; `minutes_left` is whole minutes remaining.
    fn expiry_warning(&self, minutes_left: i64);

    /// The session ended for the given reason.
    fn session_ended(&self, reason: LogoutReason);
}

/// Default notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl SessionNotifier for TracingNotifier {
    fn expiry_warning(&self, minutes_left: i64) {
        warn!(minutes_left, "session expires soon");
    }

    fn session_ended(&self, reason: LogoutReason) {
        info!(%reason, "session ended");
    }
}

/// Notifier that records every event, for tests.
#[derive(Default)]
pub struct RecordingNotifier {
    warnings: Mutex<Vec<i64>>,
    ended: Mutex<Vec<LogoutReason>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<i64> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn ended(&self) -> Vec<LogoutReason> {
        self.ended.lock().unwrap().clone()
    }
}

impl SessionNotifier for RecordingNotifier {
    fn expiry_warning(&self, minutes_left: i64) {
        self.warnings.lock().unwrap().push(minutes_left);
    }

    fn session_ended(&self, reason: LogoutReason) {
        self.ended.lock().unwrap().push(reason);
    }
}
