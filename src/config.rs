use serde::{Deserialize, Serialize};

// Default configuration values
const DEFAULT_WARNING_THRESHOLD_SECS: u64 = 300;
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Main configuration for the session control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the identity provider and API, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Endpoint paths
    #[serde(default)]
    pub endpoints: Endpoints,
    /// Durable storage keys
    #[serde(default)]
    pub storage: StorageKeys,
    /// Session monitor tuning
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Identity provider and maintenance endpoint paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_login")]
    pub login: String,
    #[serde(default = "default_register")]
    pub register: String,
    #[serde(default = "default_forgot_password")]
    pub forgot_password: String,
    #[serde(default = "default_reset_password")]
    pub reset_password: String,
    #[serde(default = "default_current_user")]
    pub current_user: String,
    #[serde(default = "default_maintenance_status")]
    pub maintenance_status: String,
}

impl Endpoints {
    /// Paths that are unauthenticated by construction and must never carry
    /// injected credentials.
    pub fn unauthenticated(&self) -> Vec<String> {
        vec![
            self.login.clone(),
            self.register.clone(),
            self.forgot_password.clone(),
            self.reset_password.clone(),
        ]
    }
}

/// Keys under which the session is mirrored into durable storage.
/// Both entries are always written or cleared together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageKeys {
    #[serde(default = "default_token_key")]
    pub token: String,
    #[serde(default = "default_user_key")]
    pub user: String,
}

/// Session monitor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Warn when this close to expiry, in seconds
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold_secs: u64,
    /// Periodic check interval, in seconds
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_login() -> String {
    "/auth/login".to_string()
}

fn default_register() -> String {
    "/auth/register".to_string()
}

fn default_forgot_password() -> String {
    "/auth/forgot-password".to_string()
}

fn default_reset_password() -> String {
    "/auth/reset-password".to_string()
}

fn default_current_user() -> String {
    "/auth/user".to_string()
}

fn default_maintenance_status() -> String {
    "/settings/maintenance-mode".to_string()
}

fn default_token_key() -> String {
    "auth.token".to_string()
}

fn default_user_key() -> String {
    "auth.user".to_string()
}

fn default_warning_threshold() -> u64 {
    DEFAULT_WARNING_THRESHOLD_SECS
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoints: Endpoints::default(),
            storage: StorageKeys::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: default_login(),
            register: default_register(),
            forgot_password: default_forgot_password(),
            reset_password: default_reset_password(),
            current_user: default_current_user(),
            maintenance_status: default_maintenance_status(),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            token: default_token_key(),
            user: default_user_key(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            warning_threshold_secs: default_warning_threshold(),
            check_interval_secs: default_check_interval(),
        }
    }
}
