//! # configs
//!
//! Layered settings for the server. Sources, lowest precedence first:
//!
//! 1. built-in defaults (the `Default` impls below)
//! 2. `config/default.toml`
//! 3. `config/local.toml` (optional, git-ignored)
//! 4. environment variables `INKWELL__<SECTION>__<KEY>`, after `.env` is loaded
//!
//! `auth.admin_ids` may be given in the environment as a comma-separated list.

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "INKWELL";

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// Settings loaded but hold an unusable value.
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    /// An `EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngagementSettings {
    /// A repeat view by the same user inside this window is not counted.
    #[serde(default = "default_view_window")]
    pub view_window_secs: u64,
}

impl Default for EngagementSettings {
    fn default() -> Self {
        Self {
            view_window_secs: default_view_window(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default = "default_category_cap")]
    pub category_cap: usize,
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            trending_limit: default_trending_limit(),
            recent_limit: default_recent_limit(),
            category_cap: default_category_cap(),
            recommendation_limit: default_recommendation_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_attempts")]
    pub delivery_attempts: u32,
    #[serde(default = "default_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            delivery_attempts: default_attempts(),
            retry_backoff_ms: default_backoff(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthSettings {
    /// User ids holding the admin role.
    #[serde(default)]
    pub admin_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub engagement: EngagementSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_level() -> String {
    "info".to_string()
}

fn default_view_window() -> u64 {
    1800
}

fn default_trending_limit() -> usize {
    5
}

fn default_recent_limit() -> usize {
    4
}

fn default_category_cap() -> usize {
    6
}

fn default_recommendation_limit() -> usize {
    4
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff() -> u64 {
    50
}

impl Settings {
    /// Loads `.env`, then layers the sources under `./config`.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "no .env file loaded");
        }
        Self::load_from(Path::new("config"))
    }

    /// Layers `<dir>/default.toml`, `<dir>/local.toml` and the environment.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_ids"),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(key: &'static str, reason: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                key,
                reason: reason.to_string(),
            })
        }

        if self.server.host.trim().is_empty() {
            return invalid("server.host", "must not be empty");
        }
        if self.server.port == 0 {
            return invalid("server.port", "must be non-zero");
        }
        if self.notifications.delivery_attempts == 0 {
            return invalid("notifications.delivery_attempts", "must be at least 1");
        }
        if self.feed.trending_limit == 0 {
            return invalid("feed.trending_limit", "must be at least 1");
        }
        if self.feed.recent_limit == 0 {
            return invalid("feed.recent_limit", "must be at least 1");
        }
        if self.feed.category_cap == 0 {
            return invalid("feed.category_cap", "must be at least 1");
        }
        if self.feed.recommendation_limit == 0 {
            return invalid("feed.recommendation_limit", "must be at least 1");
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.engagement.view_window_secs, 1800);
        assert_eq!(settings.feed.category_cap, 6);
        assert_eq!(settings.feed.recommendation_limit, 4);
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn zero_attempts_are_rejected() {
        let mut settings = Settings::default();
        settings.notifications.delivery_attempts = 0;
        let err = settings.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "notifications.delivery_attempts",
                ..
            }
        ));
    }

    #[test]
    fn zero_recommendation_limit_is_rejected() {
        let mut settings = Settings::default();
        settings.feed.recommendation_limit = 0;
        let err = settings.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "feed.recommendation_limit",
                ..
            }
        ));
    }

    #[test]
    fn files_layer_over_defaults() {
        let dir = std::env::temp_dir().join(format!("inkwell-configs-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("default.toml"),
            "[server]\nport = 9000\n[log]\nformat = \"json\"\n[auth]\nadmin_ids = [\"root\"]\n",
        )
        .unwrap();
        fs::write(dir.join("local.toml"), "[feed]\ntrending_limit = 10\n").unwrap();

        let settings = Settings::load_from(&dir).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.log.format, LogFormat::Json);
        assert_eq!(settings.feed.trending_limit, 10);
        assert_eq!(settings.feed.recent_limit, 4);
        assert_eq!(settings.auth.admin_ids, vec!["root".to_string()]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let dir = std::env::temp_dir().join(format!("inkwell-configs-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("default.toml"), "[feed]\ncategory_cap = 0\n").unwrap();

        let err = Settings::load_from(&dir).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "feed.category_cap", .. }));

        fs::remove_dir_all(&dir).unwrap();
    }
}
