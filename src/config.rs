// Configuration - Engine construction settings
// Loaded from the environment (.env supported) or from JSON

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const ENV_SEED: &str = "GRAVSIM_SEED";
pub const ENV_PRESET: &str = "GRAVSIM_PRESET";
pub const ENV_TICK_HZ: &str = "GRAVSIM_TICK_HZ";

const MAX_TICK_HZ: f64 = 10_000.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the engine's random source; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Preset loaded at construction (clamped like any preset index)
    pub preset: i32,
    /// Host stepping rate in ticks per second
    pub tick_hz: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            preset: 0,
            tick_hz: 100.0,
        }
    }
}

impl EngineConfig {
    /// Reads `GRAVSIM_*` variables, after loading a `.env` file if one exists
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = Self::default();

        if let Some(raw) = read_var(ENV_SEED) {
            config.seed = Some(parse_var(ENV_SEED, &raw)?);
        }
        if let Some(raw) = read_var(ENV_PRESET) {
            config.preset = parse_var(ENV_PRESET, &raw)?;
        }
        if let Some(raw) = read_var(ENV_TICK_HZ) {
            config.tick_hz = parse_var(ENV_TICK_HZ, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_hz > 0.0 && self.tick_hz <= MAX_TICK_HZ) {
            return Err(ConfigError::Invalid(format!(
                "tick_hz must be in (0, {}], got {}",
                MAX_TICK_HZ, self.tick_hz
            )));
        }
        Ok(())
    }

    /// Host tick period; fails instead of panicking on a rate outside `(0, 10000]`
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        self.validate()?;
        Ok(Duration::from_secs_f64(1.0 / self.tick_hz))
    }
}

fn read_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Env {
        key,
        value: raw.to_string(),
    })
}
