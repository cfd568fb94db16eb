pub mod auth;
pub mod maintenance;

use async_trait::async_trait;

pub use auth::{AdminGuard, AuthGuard};
pub use maintenance::MaintenanceGuard;

/// Predicate evaluated before a protected view is entered.
///
/// A guard that denies always redirects somewhere appropriate first; there is
/// no bare denial with nowhere to go.
#[async_trait]
pub trait RouteGuard: Send + Sync {
    async fn can_activate(&self) -> bool;
}
