//! Application configuration
//!
//! Everything has a default; a TOML file only needs the keys it changes.

use crate::session::ParkingPreferences;
use crate::speech::VoiceSettings;
use crate::{ParkbotError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Simulated search latency bounds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            min_ms: 1000,
            max_ms: 2000,
        }
    }
}

impl LatencyConfig {
    /// Draw a delay uniformly from `[min_ms, max_ms]`
    pub fn sample_delay(&self) -> Duration {
        let ms = if self.min_ms >= self.max_ms {
            self.min_ms
        } else {
            rand::thread_rng().gen_range(self.min_ms..=self.max_ms)
        };
        Duration::from_millis(ms)
    }
}

/// Voice parameters and reply behavior
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// Pause between a reply appearing and it being spoken
    pub reply_delay_ms: u64,
    /// Speak assistant replies when output is available
    pub speak_replies: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let voice = VoiceSettings::default();
        Self {
            rate: voice.rate,
            pitch: voice.pitch,
            volume: voice.volume,
            reply_delay_ms: 500,
            speak_replies: true,
        }
    }
}

impl SpeechConfig {
    pub fn voice(&self) -> VoiceSettings {
        VoiceSettings {
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
        }
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

/// Controller thread settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Channel buffer size
    pub channel_buffer_size: usize,
    /// Shutdown timeout in milliseconds
    pub shutdown_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 100,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl RuntimeConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub latency: LatencyConfig,
    pub speech: SpeechConfig,
    pub runtime: RuntimeConfig,
    /// Preferences a fresh session starts with, and resets to
    pub preferences: ParkingPreferences,
}

impl AppConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ParkbotError::IOError(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            ParkbotError::ConfigError(msg) => {
                ParkbotError::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| ParkbotError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/parkbot/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("parkbot").join("config.toml"))
    }

    /// Load the default file if it exists, otherwise use defaults
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.latency.min_ms > self.latency.max_ms {
            return Err(ParkbotError::ConfigError(format!(
                "latency.min_ms ({}) exceeds latency.max_ms ({})",
                self.latency.min_ms, self.latency.max_ms
            )));
        }

        let speech = &self.speech;
        if !(speech.rate > 0.0 && speech.rate <= 10.0) {
            return Err(ParkbotError::ConfigError(format!(
                "speech.rate must be in (0, 10], got {}",
                speech.rate
            )));
        }
        if !(0.0..=2.0).contains(&speech.pitch) {
            return Err(ParkbotError::ConfigError(format!(
                "speech.pitch must be in [0, 2], got {}",
                speech.pitch
            )));
        }
        if !(0.0..=1.0).contains(&speech.volume) {
            return Err(ParkbotError::ConfigError(format!(
                "speech.volume must be in [0, 1], got {}",
                speech.volume
            )));
        }

        if self.runtime.channel_buffer_size == 0 {
            return Err(ParkbotError::ConfigError(
                "runtime.channel_buffer_size must be positive".to_string(),
            ));
        }

        self.preferences.validate()
    }

    /// Set the simulated latency bounds
    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency = LatencyConfig { min_ms, max_ms };
        self
    }

    /// Set the reply delay
    pub fn with_reply_delay_ms(mut self, delay: u64) -> Self {
        self.speech.reply_delay_ms = delay;
        self
    }

    /// Keep replies text-only
    pub fn without_spoken_replies(mut self) -> Self {
        self.speech.speak_replies = false;
        self
    }

    /// Set the default preferences
    pub fn with_preferences(mut self, preferences: ParkingPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Set the channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.runtime.channel_buffer_size = size;
        self
    }

    /// Set the shutdown timeout
    pub fn with_shutdown_timeout_ms(mut self, timeout: u64) -> Self {
        self.runtime.shutdown_timeout_ms = timeout;
        self
    }
}
