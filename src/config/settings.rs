use clap::ArgMatches;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::modbus::DEFAULT_PORT;
use crate::utils::error::ConfigError;

pub const DEFAULT_HOST: &str = "192.168.1.200";
pub const DEFAULT_DEVICE_NAME: &str = "Waveshare Relay";
pub const DEFAULT_CHANNELS: u16 = 8;
pub const MAX_CHANNELS: u16 = 32;
pub const DEFAULT_CHANNEL_INTERVAL_SECONDS: u16 = 5;
pub const MAX_CHANNEL_INTERVAL_SECONDS: u16 = 600;

/// Connection parameters and per-channel settings for one relay board.
///
/// The protocol layer never reads this directly; it is handed host, port
/// and intervals per call by whoever owns the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Connection settings
    pub host: String,
    pub port: u16,
    /// Deadline for one whole exchange, connect included.
    pub timeout_ms: u64,

    // Board description
    pub device_name: String,
    pub channels: u16,
    pub enable_timer: bool,

    // Polling settings
    pub scan_interval_seconds: u64,
    pub watch_interval_ms: u64,

    /// On-interval in seconds, indexed by 0-based channel. Missing entries use the default.
    pub channel_intervals: Vec<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_ms: 5000,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            channels: DEFAULT_CHANNELS,
            enable_timer: true,
            scan_interval_seconds: 30,
            watch_interval_ms: 1000,
            channel_intervals: Vec::new(),
        }
    }
}

impl Config {
    /// Starts from `--config` (or defaults) and applies command line overrides on top.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        let mut config = match matches.get_one::<PathBuf>("config") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(host) = matches.get_one::<String>("host") {
            config.host = host.clone();
        }
        if let Some(port) = matches.get_one::<u16>("port") {
            config.port = *port;
        }
        if let Some(timeout_ms) = matches.get_one::<u64>("timeout_ms") {
            config.timeout_ms = *timeout_ms;
        }
        if let Some(channels) = matches.get_one::<u16>("channels") {
            config.channels = *channels;
        }

        config.validate()?;
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)?;
        info!("📄 Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must not be 0".to_string()));
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(ConfigError::Invalid(format!(
                "channels must be between 1 and {}, got {}",
                MAX_CHANNELS, self.channels
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be greater than 0".to_string()));
        }
        if self.scan_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "scan_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.watch_interval_ms == 0 {
            return Err(ConfigError::Invalid("watch_interval_ms must be greater than 0".to_string()));
        }
        if let Some((channel, seconds)) = self
            .channel_intervals
            .iter()
            .enumerate()
            .find(|(_, s)| **s > MAX_CHANNEL_INTERVAL_SECONDS)
        {
            return Err(ConfigError::Invalid(format!(
                "interval for channel {} is {}s, maximum is {}s",
                channel + 1,
                seconds,
                MAX_CHANNEL_INTERVAL_SECONDS
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_seconds)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    pub fn channel_interval_seconds(&self, channel: u8) -> u16 {
        self.channel_intervals
            .get(usize::from(channel))
            .copied()
            .unwrap_or(DEFAULT_CHANNEL_INTERVAL_SECONDS)
    }

    pub fn channel_interval_deciseconds(&self, channel: u8) -> u16 {
        self.channel_interval_seconds(channel) * 10
    }

    pub fn set_channel_interval(&mut self, channel: u8, seconds: u16) -> Result<(), ConfigError> {
        if seconds > MAX_CHANNEL_INTERVAL_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "interval {}s exceeds maximum of {}s",
                seconds, MAX_CHANNEL_INTERVAL_SECONDS
            )));
        }

        let index = usize::from(channel);
        if self.channel_intervals.len() <= index {
            self.channel_intervals
                .resize(index + 1, DEFAULT_CHANNEL_INTERVAL_SECONDS);
        }
        self.channel_intervals[index] = seconds;
        Ok(())
    }

    /// Interval to send when switching `channel` on: the timed interval when
    /// the timer is enabled, otherwise 0 (stay on).
    pub fn on_interval(&self, channel: u8) -> u16 {
        if self.enable_timer {
            self.channel_interval_deciseconds(channel)
        } else {
            0
        }
    }

    /// Accepts a 1-based channel number and returns the 0-based relay address.
    pub fn relay_address(&self, channel: u16) -> Result<u8, ConfigError> {
        if channel == 0 || channel > self.channels {
            return Err(ConfigError::Invalid(format!(
                "channel must be between 1 and {}, got {}",
                self.channels, channel
            )));
        }
        Ok((channel - 1) as u8)
    }
}
