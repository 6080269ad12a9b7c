use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::calendar::LeapDayPolicy;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
/// Job id the due-wish sweeper registers under.
pub const DUE_WISHES_JOB_ID: &str = "due_wishes_job";

/// Top-level config (wishbox.toml + WISHBOX_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WishboxConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            auth: AuthConfig::default(),
        }
    }
}

/// Guards the owner-scoped API. Public share and reveal routes ignore it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Token,
            token: Some("change-me".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    Token,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Override with env var: WISHBOX_SCHEDULER__ENABLED=false
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    #[serde(default)]
    pub leap_day: LeapDayPolicy,
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.wishbox/wishbox.db", home)
}

impl WishboxConfig {
    /// Load config from a TOML file with WISHBOX_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.wishbox/wishbox.toml
    ///
    /// Nested keys use a double underscore in env vars, e.g.
    /// `WISHBOX_SCHEDULER__INTERVAL_SECS=30`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        tracing::debug!(path = %path, "loading config");

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::WishboxError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(WishboxConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("WISHBOX_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.wishbox/wishbox.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg: WishboxConfig = Figment::from(Serialized::defaults(WishboxConfig::default()))
            .merge(Toml::file("/nonexistent/wishbox.toml"))
            .extract()
            .unwrap();
        assert_eq!(cfg.gateway.port, DEFAULT_PORT);
        assert!(cfg.scheduler.enabled);
        assert_eq!(cfg.scheduler.interval_secs, 60);
        assert_eq!(cfg.calendar.leap_day, LeapDayPolicy::Feb28);
    }

    #[test]
    fn toml_overrides_nested_sections() {
        let toml = r#"
            [scheduler]
            enabled = false
            interval_secs = 15

            [calendar]
            leap_day = "mar1"

            [gateway.auth]
            mode = "none"
        "#;
        let cfg: WishboxConfig = Figment::from(Serialized::defaults(WishboxConfig::default()))
            .merge(Toml::string(toml))
            .extract()
            .unwrap();
        assert!(!cfg.scheduler.enabled);
        assert_eq!(cfg.scheduler.interval_secs, 15);
        assert_eq!(cfg.calendar.leap_day, LeapDayPolicy::Mar1);
        assert_eq!(cfg.gateway.auth.mode, AuthMode::None);
        assert_eq!(cfg.gateway.bind, DEFAULT_BIND);
    }
}
