use crate::core::fetcher::DEFAULT_ENDPOINT_TEMPLATE;
use crate::core::models::DataPath;
use crate::core::platform::{Platform, PlatformRegistry};
use crate::core::scheduler::PollerConfig;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::time::Duration;

/// Settings supplied to the tracker at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub platform: Platform,
    pub sounds: bool,
    pub messages: bool,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub endpoint_template: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Pc,
            sounds: true,
            messages: true,
            poll_interval_secs: 60,
            request_timeout_secs: 5,
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
        }
    }
}

impl TrackerConfig {
    pub const KEYS: [&'static str; 6] = [
        "platform",
        "sounds",
        "messages",
        "poll_interval_secs",
        "request_timeout_secs",
        "endpoint_template",
    ];

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: self.poll_interval(),
            platform: self.platform,
        }
    }

    pub fn validate(&self) -> io::Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(invalid_input("poll_interval_secs must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid_input("request_timeout_secs must be at least 1"));
        }
        if self.request_timeout_secs >= self.poll_interval_secs {
            return Err(invalid_input(
                "request_timeout_secs must be shorter than poll_interval_secs",
            ));
        }
        validate_endpoint_template(&self.endpoint_template)
    }

    pub fn get(&self, key: &str) -> io::Result<String> {
        let value = match key {
            "platform" => self.platform.to_string(),
            "sounds" => self.sounds.to_string(),
            "messages" => self.messages.to_string(),
            "poll_interval_secs" => self.poll_interval_secs.to_string(),
            "request_timeout_secs" => self.request_timeout_secs.to_string(),
            "endpoint_template" => self.endpoint_template.clone(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a key from its textual form; the result is validated as a whole
    pub fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        let mut updated = self.clone();
        match key {
            "platform" => updated.platform = value.parse().map_err(invalid_input)?,
            "sounds" => updated.sounds = parse_bool(key, value)?,
            "messages" => updated.messages = parse_bool(key, value)?,
            "poll_interval_secs" => updated.poll_interval_secs = parse_secs(key, value)?,
            "request_timeout_secs" => updated.request_timeout_secs = parse_secs(key, value)?,
            "endpoint_template" => updated.endpoint_template = value.trim().to_string(),
            _ => return Err(unknown_key(key)),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

pub fn validate_endpoint_template(template: &str) -> io::Result<()> {
    if !template.contains("{suffix}") {
        return Err(invalid_input(
            "endpoint_template must contain the {suffix} placeholder",
        ));
    }

    for platform in Platform::ALL {
        let endpoint = PlatformRegistry::endpoint_url(template, platform);
        let url = url::Url::parse(&endpoint)
            .map_err(|e| invalid_input(format!("Invalid endpoint URL '{endpoint}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid_input(format!(
                "Endpoint URL must use http:// or https://, got '{endpoint}'"
            )));
        }
    }

    Ok(())
}

fn parse_bool(key: &str, value: &str) -> io::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid_input(format!(
            "{key} expects true or false, got '{value}'"
        ))),
    }
}

fn parse_secs(key: &str, value: &str) -> io::Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| invalid_input(format!("{key} expects a number of seconds: {e}")))
}

fn invalid_input(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.into())
}

fn unknown_key(key: &str) -> io::Error {
    invalid_input(format!(
        "Unknown config key '{key}' (known keys: {})",
        TrackerConfig::KEYS.join(", ")
    ))
}

pub struct ConfigService;

impl ConfigService {
    /// Load the config, falling back to defaults when no file exists yet
    pub fn load_config(data_path: &DataPath) -> io::Result<TrackerConfig> {
        let config_path = data_path.config_path();
        if !config_path.exists() {
            info!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(TrackerConfig::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: TrackerConfig = toml::from_str(&content).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid config format in {}: {e}", config_path.display()),
            )
        })?;
        config.validate().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid config value in {}: {e}", config_path.display()),
            )
        })?;

        info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    pub fn save_config(config: &TrackerConfig, data_path: &DataPath) -> io::Result<()> {
        let config_path = data_path.config_path();
        let toml_content = toml::to_string_pretty(config).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to serialize config: {e}"),
            )
        })?;

        fs::create_dir_all(&data_path.root)?;
        fs::write(&config_path, toml_content)?;
        info!("Saved configuration to {}", config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_data_path() -> (TempDir, DataPath) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = DataPath::new(Some(dir.path().join("tracker"))).unwrap();
        (dir, data_path)
    }

    #[test]
    fn test_missing_file_gives_defaults_without_writing() {
        let (_dir, data_path) = temp_data_path();

        let config = ConfigService::load_config(&data_path).unwrap();

        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.platform, Platform::Pc);
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(!data_path.config_path().exists());
    }

    #[test]
    fn test_save_and_reload() {
        let (_dir, data_path) = temp_data_path();
        let mut config = TrackerConfig::default();
        config.set("platform", "ps4").unwrap();
        config.set("sounds", "off").unwrap();

        ConfigService::save_config(&config, &data_path).unwrap();
        let loaded = ConfigService::load_config(&data_path).unwrap();

        assert_eq!(loaded.platform, Platform::Ps4);
        assert!(!loaded.sounds);
        assert!(loaded.messages);
        let raw = fs::read_to_string(data_path.config_path()).unwrap();
        assert!(raw.contains("platform = \"PS4\""));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let (_dir, data_path) = temp_data_path();
        fs::create_dir_all(&data_path.root).unwrap();
        fs::write(data_path.config_path(), "platform = \"XB1\"\n").unwrap();

        let config = ConfigService::load_config(&data_path).unwrap();

        assert_eq!(config.platform, Platform::Xb1);
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.endpoint_template, DEFAULT_ENDPOINT_TEMPLATE);
    }

    #[test]
    fn test_malformed_file_is_invalid_data() {
        let (_dir, data_path) = temp_data_path();
        fs::create_dir_all(&data_path.root).unwrap();

        for content in [
            "platform = [",
            "platform = \"N64\"",
            "sounds = \"maybe\"",
            "poll_interval_secs = 10\nrequest_timeout_secs = 30",
        ] {
            fs::write(data_path.config_path(), content).unwrap();
            let err = ConfigService::load_config(&data_path).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidData, "content: {content}");
            assert!(err.to_string().contains("config"));
        }
    }

    #[test]
    fn test_set_rejects_bad_values_and_keeps_old_state() {
        let mut config = TrackerConfig::default();

        assert!(config.set("platform", "switch").is_err());
        assert!(config.set("poll_interval_secs", "abc").is_err());
        assert!(config.set("request_timeout_secs", "60").is_err());
        assert!(config.set("endpoint_template", "https://example.com/state").is_err());
        assert!(config.set("endpoint_template", "ftp://host{suffix}/x").is_err());
        assert!(config.set("volume", "11").is_err());

        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn test_get_known_and_unknown_keys() {
        let config = TrackerConfig::default();

        assert_eq!(config.get("platform").unwrap(), "PC");
        assert_eq!(config.get("sounds").unwrap(), "true");
        assert_eq!(config.get("request_timeout_secs").unwrap(), "5");
        assert!(config.get("volume").is_err());
    }
}
