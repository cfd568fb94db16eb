pub mod authenticator;
pub mod client;
pub mod maintenance;
pub mod pipeline;

pub use authenticator::RequestAuthenticator;
pub use client::{HttpClient, HttpResponse, ReqwestHttpClient};
pub use maintenance::{MaintenanceClient, MaintenanceGate};
pub use pipeline::ApiClient;
