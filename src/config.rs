//! Client configuration.
//!
//! Read from an optional JSON file, then overridden by `ORDER_DESK_*`
//! environment variables. Every field has a default so an empty file (or
//! no file) yields a working localhost setup.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::auth::Role;
use crate::error::{DeskError, DeskResult};

const ENV_BASE_URL: &str = "ORDER_DESK_BASE_URL";
const ENV_ROLE: &str = "ORDER_DESK_ROLE";
const ENV_SESSION_COOKIE: &str = "ORDER_DESK_SESSION_COOKIE";
const ENV_LOG_DIR: &str = "ORDER_DESK_LOG_DIR";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub base_url: String,
    /// Raw `Cookie` header value identifying the logged-in session.
    pub session_cookie: Option<String>,
    /// Role supplied by the server's page/session payload.
    pub role: Option<Role>,
    /// Prefix of desktop notification titles.
    pub business_name: String,
    pub notification_icon: String,

    pub notification_poll_secs: u64,
    pub order_poll_secs: u64,
    pub request_timeout_secs: u64,

    /// Time a departing row stays visible while its removal animation runs.
    pub removal_delay_ms: u64,
    pub stock_refresh_delay_ms: u64,
    pub mark_read_delay_ms: u64,
    pub ready_refresh_delay_ms: u64,
    pub notification_followup_ms: u64,

    pub log: LogConfig,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            session_cookie: None,
            role: None,
            business_name: "Leshley's Eatery".to_string(),
            notification_icon: "/static/logo.png".to_string(),
            notification_poll_secs: 30,
            order_poll_secs: 10,
            request_timeout_secs: 30,
            removal_delay_ms: 500,
            stock_refresh_delay_ms: 1_000,
            mark_read_delay_ms: 1_000,
            ready_refresh_delay_ms: 1_500,
            notification_followup_ms: 1_000,
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for rolling log files; platform data dir when unset.
    pub dir: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filter: "info,order_desk=debug".to_string(),
            max_files: 10,
        }
    }
}

impl DeskConfig {
    /// Load from `path` (when given and present), then apply env overrides.
    pub fn load(path: Option<&Path>) -> DeskResult<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)?;
                let parsed = Self::from_json(&raw)?;
                info!(path = %p.display(), "loaded configuration file");
                parsed
            }
            _ => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> DeskResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|e| DeskError::Config(format!("invalid JSON: {e}")))
    }

    fn apply_env(&mut self) -> DeskResult<()> {
        if let Some(url) = env_non_empty(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(role) = env_non_empty(ENV_ROLE) {
            self.role = Some(role.parse().map_err(DeskError::Config)?);
        }
        if let Some(cookie) = env_non_empty(ENV_SESSION_COOKIE) {
            self.session_cookie = Some(cookie);
        }
        if let Some(dir) = env_non_empty(ENV_LOG_DIR) {
            self.log.dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    fn validate(&self) -> DeskResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(DeskError::Config("base_url must not be empty".into()));
        }
        if self.notification_poll_secs == 0 || self.order_poll_secs == 0 {
            return Err(DeskError::Config("poll intervals must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(DeskError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notification_poll_interval(&self) -> Duration {
        Duration::from_secs(self.notification_poll_secs)
    }

    pub fn order_poll_interval(&self) -> Duration {
        Duration::from_secs(self.order_poll_secs)
    }

    pub fn removal_delay(&self) -> Duration {
        Duration::from_millis(self.removal_delay_ms)
    }

    pub fn stock_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.stock_refresh_delay_ms)
    }

    pub fn mark_read_delay(&self) -> Duration {
        Duration::from_millis(self.mark_read_delay_ms)
    }

    pub fn ready_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.ready_refresh_delay_ms)
    }

    pub fn notification_followup(&self) -> Duration {
        Duration::from_millis(self.notification_followup_ms)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [ENV_BASE_URL, ENV_ROLE, ENV_SESSION_COOKIE, ENV_LOG_DIR] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults_match_ui_timings() {
        let config = DeskConfig::default();
        assert_eq!(config.removal_delay(), Duration::from_millis(500));
        assert_eq!(config.notification_poll_interval(), Duration::from_secs(30));
        assert_eq!(config.order_poll_interval(), Duration::from_secs(10));
        assert_eq!(config.ready_refresh_delay(), Duration::from_millis(1_500));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            DeskConfig::from_json(r#"{"base_url": "https://eatery.example", "role": "staff"}"#)
                .unwrap();
        assert_eq!(config.base_url, "https://eatery.example");
        assert_eq!(config.role, Some(Role::Staff));
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.log.max_files, 10);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = DeskConfig::from_json("{base_url:").unwrap_err();
        assert!(matches!(err, DeskError::Config(_)));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        clear_env();
        std::env::set_var(ENV_BASE_URL, "https://override.example");
        std::env::set_var(ENV_ROLE, "customer");

        let config = DeskConfig::load(None).unwrap();
        assert_eq!(config.base_url, "https://override.example");
        assert_eq!(config.role, Some(Role::Customer));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_bad_env_role_is_rejected() {
        clear_env();
        std::env::set_var(ENV_ROLE, "chef");
        let err = DeskConfig::load(None).unwrap_err();
        assert!(matches!(err, DeskError::Config(_)));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_poll_interval_fails_validation() {
        clear_env();
        let dir = std::env::temp_dir().join(format!("desk_cfg_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("desk.json");
        std::fs::write(&path, r#"{"order_poll_secs": 0}"#).unwrap();

        let err = DeskConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, DeskError::Config(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
