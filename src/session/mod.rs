pub mod monitor;
pub mod service;
pub mod state;
pub mod store;

pub use monitor::{MonitorCheck, SessionMonitor};
pub use service::SessionService;
pub use state::{AuthState, LogoutReason, Role, User};
pub use store::SessionStore;
