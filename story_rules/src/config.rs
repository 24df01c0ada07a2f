//! Tunable engine parameters.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RulesError;

/// Where and how a fresh run begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartConfig {
    pub node: String,
    pub hp: i32,
    pub coins: i32,
    pub karma: i32,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            node: "start".to_string(),
            hp: 5,
            coins: 0,
            karma: 0,
        }
    }
}

/// Engine configuration. Every field is optional in TOML and falls back to
/// the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ticks per full day+night cycle.
    pub cycle_length: u64,
    pub stat_min: i32,
    pub stat_max: i32,
    /// Undo depth kept in memory.
    pub history_limit: usize,
    /// Trail entries kept in a save blob.
    pub saved_history_limit: usize,
    /// Chance of a bonus coin when leaving a random-event node.
    pub event_bonus_chance: f64,
    pub start: StartConfig,
}

impl EngineConfig {
    pub const DEFAULT_CYCLE_LENGTH: u64 = 8;
    pub const MIN_CYCLE_LENGTH: u64 = 2;
    pub const STAT_MIN: i32 = -99;
    pub const STAT_MAX: i32 = 99;
    pub const HISTORY_LIMIT: usize = 60;
    pub const SAVED_HISTORY_LIMIT: usize = 30;
    pub const EVENT_BONUS_CHANCE: f64 = 0.35;

    pub fn new() -> Self {
        Self {
            cycle_length: Self::DEFAULT_CYCLE_LENGTH,
            stat_min: Self::STAT_MIN,
            stat_max: Self::STAT_MAX,
            history_limit: Self::HISTORY_LIMIT,
            saved_history_limit: Self::SAVED_HISTORY_LIMIT,
            event_bonus_chance: Self::EVENT_BONUS_CHANCE,
            start: StartConfig::default(),
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, RulesError> {
        let config: Self = toml::from_str(text)?;
        Ok(config.normalized())
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Cycle length actually used by the clock; a cycle always has a day
    /// half and a night half.
    pub fn effective_cycle_length(&self) -> u64 {
        self.cycle_length.max(Self::MIN_CYCLE_LENGTH)
    }

    /// Clamp a stat value into the configured bounds. Reversed bounds are
    /// read in order.
    pub fn clamp_stat(&self, value: i64) -> i32 {
        let lo = self.stat_min.min(self.stat_max) as i64;
        let hi = self.stat_min.max(self.stat_max) as i64;
        value.max(lo).min(hi) as i32
    }

    /// Repair degenerate values: short cycles, swapped stat bounds and
    /// out-of-range chances.
    pub fn normalized(mut self) -> Self {
        self.cycle_length = self.effective_cycle_length();
        if self.stat_min > self.stat_max {
            std::mem::swap(&mut self.stat_min, &mut self.stat_max);
        }
        self.event_bonus_chance = self.event_bonus_chance.clamp(0.0, 1.0);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
