//! Simulation tuning loaded from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "grid_width": 40, "seed": 7 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid_width: i32,
    pub grid_height: i32,
    /// Chase AI notices the player within this Euclidean distance.
    pub aggro_range: f32,
    /// A sleeping fly wizard wakes when the player is this close.
    pub wizard_wake_range: f32,
    pub wizard_teleport_range: i32,
    pub wizard_flies: u32,
    pub burn_turns: u32,
    pub burn_damage: i32,
    pub explosion_radius: i32,
    pub explosion_damage: i32,
    /// Explosions further than this from the player emit no feedback.
    pub feedback_range: f32,
    pub animation_frame_ms: u32,
    /// Bombs placed under the player on depth 1.
    pub starting_bombs: u32,
    pub throw_range: i32,
    /// Fixed RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Upper bound on empty polling steps before the player must get a turn.
    pub max_idle_steps: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 30,
            grid_height: 30,
            aggro_range: 15.0,
            wizard_wake_range: 4.0,
            wizard_teleport_range: 6,
            wizard_flies: 5,
            burn_turns: 5,
            burn_damage: 1,
            explosion_radius: 1,
            explosion_damage: 10,
            feedback_range: 10.0,
            animation_frame_ms: 250,
            starting_bombs: 3,
            throw_range: 5,
            seed: None,
            max_idle_steps: 10_000,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("loaded config: {}x{} grid", config.grid_width, config.grid_height);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builder shorthand used by tests and demos.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimConfig::from_json(r#"{ "grid_width": 12, "seed": 9 }"#).unwrap();
        assert_eq!(config.grid_width, 12);
        assert_eq!(config.grid_height, 30);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.explosion_damage, 10);
    }

    #[test]
    fn serialized_config_reads_back() {
        let config = SimConfig::default().with_seed(4);
        let json = config.to_json().unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SimConfig::from_json("{ grid_width: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SimConfig::load("/nonexistent/delve.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
