use config::ConfigError;
use serde::Deserialize;
use std::env;

/// Longest hold a deployment may configure. Holds soft-lock a checkout, not
/// a season.
pub const MAX_HOLD_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub holds: HoldSettings,
}

/// Table/seat hold tuning
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HoldSettings {
    #[serde(default = "default_hold_seconds")]
    pub hold_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for HoldSettings {
    fn default() -> Self {
        Self {
            hold_seconds: default_hold_seconds(),
            sweep_interval_seconds: default_sweep_interval(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl HoldSettings {
    /// A zero-length hold would expire on creation and let every claimant
    /// win, so only `1..=MAX_HOLD_SECONDS` is accepted.
    pub fn hold_duration(&self) -> Result<chrono::Duration, ConfigError> {
        if self.hold_seconds == 0 || self.hold_seconds > MAX_HOLD_SECONDS {
            return Err(ConfigError::Message(format!(
                "holds.hold_seconds must be between 1 and {}, got {}",
                MAX_HOLD_SECONDS, self.hold_seconds
            )));
        }

        i64::try_from(self.hold_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| ConfigError::Message(format!("holds.hold_seconds out of range: {}", self.hold_seconds)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hold_duration()?;
        if self.max_batch_size == 0 {
            return Err(ConfigError::Message("holds.max_batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

fn default_hold_seconds() -> u64 { 600 }
fn default_sweep_interval() -> u64 { 60 }
fn default_max_batch_size() -> usize { encore_core::reservation::DEFAULT_MAX_BATCH_SIZE }

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `ENCORE_HOLDS__HOLD_SECONDS=300`
            .add_source(config::Environment::with_prefix("ENCORE").separator("__"))
            .build()?;

        Self::from_settings(s)
    }

    /// Deserialize and reject hold settings that would break the hold mechanism
    pub fn from_settings(settings: config::Config) -> Result<Self, ConfigError> {
        let config: Self = settings.try_deserialize()?;
        config.holds.validate()?;
        Ok(config)
    }
}
