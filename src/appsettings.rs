use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Deserialize, Debug)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Deserialize, Debug)]
pub struct SchedulerSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl SchedulerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct UploadsSettings {
    pub dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Deserialize, Debug)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl_hours")]
    pub ttl_hours: i64,
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_hours: default_session_ttl_hours(),
            secure_cookie: false,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    pub uploads: UploadsSettings,
    /// Email delivery is switched off when this section is missing.
    pub email: Option<EmailSettings>,
    #[serde(default)]
    pub session: SessionSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").prefix_separator("__").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_max_upload_bytes() -> u64 {
    100 * 1024 * 1024
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> AppSettings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let settings = parse(
            r#"
            [database]
            url = "sqlite://glowfit.db"

            [server]
            bind = "127.0.0.1:3000"

            [uploads]
            dir = "uploads"
            "#,
        );

        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.scheduler.poll_interval(), Duration::from_secs(60));
        assert_eq!(settings.uploads.max_bytes, 100 * 1024 * 1024);
        assert_eq!(settings.session.ttl_hours, 168);
        assert!(!settings.session.secure_cookie);
        assert!(settings.email.is_none());
    }

    #[test]
    fn email_section_is_read_when_present() {
        let settings = parse(
            r#"
            [database]
            url = "sqlite::memory:"

            [server]
            bind = "0.0.0.0:8080"

            [scheduler]
            poll_interval_secs = 0

            [uploads]
            dir = "/tmp/glowfit"
            max_bytes = 1024

            [email]
            api_url = "https://mail.example.com/send"
            api_key = "secret"
            from = "GlowFit <noreply@example.com>"
            "#,
        );

        let email = settings.email.unwrap();
        assert_eq!(email.from, "GlowFit <noreply@example.com>");
        assert_eq!(settings.scheduler.poll_interval(), Duration::from_secs(1));
        assert_eq!(settings.uploads.max_bytes, 1024);
    }
}
