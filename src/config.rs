//! Environment based configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::AppError;

/// Optional subsystems that can be switched off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Features {
    pub feed_pollers: bool,
    pub daily: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            feed_pollers: true,
            daily: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub admin_id: Option<u64>,
    pub db_url: String,
    pub db_path: String,
    pub logs_path: PathBuf,
    pub nyaa_poll_interval: Duration,
    pub mangadex_poll_interval: Duration,
    pub jnovel_poll_interval: Duration,
    pub http_timeout: Duration,
    pub weekly_timezone: Tz,
    /// Commands are registered to this guild only and pollers stay off.
    pub test_guild_id: Option<u64>,
    pub features: Features,
}

impl Config {
    pub fn new() -> Self {
        Self {
            discord_token: String::new(),
            admin_id: None,
            db_url: "sqlite://data/data.db".to_string(),
            db_path: "data/data.db".to_string(),
            logs_path: PathBuf::from("./logs"),
            nyaa_poll_interval: Duration::from_secs(5),
            mangadex_poll_interval: Duration::from_secs(60),
            jnovel_poll_interval: Duration::from_secs(5),
            http_timeout: Duration::from_secs(30),
            weekly_timezone: chrono_tz::America::New_York,
            test_guild_id: None,
            features: Features::default(),
        }
    }

    /// Overrides the defaults with environment variables.
    pub fn load(&mut self) -> Result<(), AppError> {
        self.discord_token = std::env::var("DISCORD_TOKEN").map_err(|_| AppError::MissingConfig {
            key: "DISCORD_TOKEN".to_string(),
        })?;

        if let Some(admin_id) = parse_var::<u64>("ADMIN_ID")? {
            self.admin_id = Some(admin_id);
        }
        if let Ok(db_url) = std::env::var("DB_URL") {
            self.db_url = db_url;
        }
        if let Ok(db_path) = std::env::var("DB_PATH") {
            self.db_path = db_path;
        }
        if let Ok(logs_path) = std::env::var("LOGS_PATH") {
            self.logs_path = PathBuf::from(logs_path);
        }
        if let Some(secs) = parse_var::<u64>("NYAA_POLL_INTERVAL")? {
            self.nyaa_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>("MANGADEX_POLL_INTERVAL")? {
            self.mangadex_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>("JNOVEL_POLL_INTERVAL")? {
            self.jnovel_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>("HTTP_TIMEOUT")? {
            self.http_timeout = Duration::from_secs(secs);
        }
        if let Some(tz) = parse_var::<Tz>("WEEKLY_TIMEZONE")? {
            self.weekly_timezone = tz;
        }
        self.test_guild_id = parse_var::<u64>("TEST_GUILD_ID")?;
        if let Some(enabled) = parse_flag("FEATURE_FEED_POLLERS")? {
            self.features.feed_pollers = enabled;
        }
        if let Some(enabled) = parse_flag("FEATURE_DAILY")? {
            self.features.daily = enabled;
        }

        Ok(())
    }

    /// Whether the feed poll loops should run.
    pub fn pollers_enabled(&self) -> bool {
        self.features.feed_pollers && self.test_guild_id.is_none()
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, AppError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::ConfigurationError {
                msg: format!("Invalid value \"{}\" for {}", value, key),
            }),
        _ => Ok(None),
    }
}

fn parse_flag(key: &str) -> Result<Option<bool>, AppError> {
    match std::env::var(key) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(AppError::ConfigurationError {
                msg: format!("Invalid value \"{}\" for {}", value, key),
            }),
        },
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const KEYS: [&str; 6] = [
        "DISCORD_TOKEN",
        "ADMIN_ID",
        "NYAA_POLL_INTERVAL",
        "WEEKLY_TIMEZONE",
        "TEST_GUILD_ID",
        "FEATURE_DAILY",
    ];

    fn clear_env() {
        for key in KEYS {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_load_requires_token() {
        clear_env();
        let mut config = Config::new();
        match config.load() {
            Err(AppError::MissingConfig { key }) => assert_eq!(key, "DISCORD_TOKEN"),
            other => panic!("Expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_load_overrides_defaults() {
        clear_env();
        unsafe {
            std::env::set_var("DISCORD_TOKEN", "token");
            std::env::set_var("ADMIN_ID", "1234");
            std::env::set_var("NYAA_POLL_INTERVAL", "10");
            std::env::set_var("WEEKLY_TIMEZONE", "Europe/Berlin");
            std::env::set_var("FEATURE_DAILY", "off");
        }

        let mut config = Config::new();
        config.load().unwrap();
        clear_env();

        assert_eq!(config.discord_token, "token");
        assert_eq!(config.admin_id, Some(1234));
        assert_eq!(config.nyaa_poll_interval, Duration::from_secs(10));
        assert_eq!(config.mangadex_poll_interval, Duration::from_secs(60));
        assert_eq!(config.weekly_timezone, chrono_tz::Europe::Berlin);
        assert!(!config.features.daily);
        assert!(config.pollers_enabled());
    }

    #[test]
    #[serial]
    fn test_test_guild_disables_pollers() {
        clear_env();
        unsafe {
            std::env::set_var("DISCORD_TOKEN", "token");
            std::env::set_var("TEST_GUILD_ID", "99");
        }

        let mut config = Config::new();
        config.load().unwrap();
        clear_env();

        assert_eq!(config.test_guild_id, Some(99));
        assert!(!config.pollers_enabled());
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_rejected() {
        clear_env();
        unsafe {
            std::env::set_var("DISCORD_TOKEN", "token");
            std::env::set_var("ADMIN_ID", "not-a-number");
        }

        let mut config = Config::new();
        let result = config.load();
        clear_env();

        assert!(matches!(result, Err(AppError::ConfigurationError { .. })));
    }
}
