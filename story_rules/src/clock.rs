//! Day/night clock and per-cycle weather.
//!
//! Time is counted in ticks. A cycle is one day half followed by one night
//! half. Weather is rolled once per cycle from the run seed, so it holds
//! steady for the whole day/night pair no matter how many choices are taken.

use serde::{Deserialize, Serialize};

use crate::rng::StoryRng;

/// Phase of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimePhase {
    #[default]
    Day,
    Night,
}

impl TimePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePhase::Day => "day",
            TimePhase::Night => "night",
        }
    }
}

impl std::fmt::Display for TimePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weather categories, from most to least likely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Fog,
    Storm,
    Snow,
}

impl Weather {
    /// Cumulative upper bounds for each category. The last bound is 1.0 so
    /// every draw in `[0, 1)` maps somewhere.
    const TABLE: [(f64, Weather); 5] = [
        (0.55, Weather::Clear),
        (0.75, Weather::Rain),
        (0.88, Weather::Fog),
        (0.96, Weather::Storm),
        (1.0, Weather::Snow),
    ];

    /// Map a draw in `[0, 1)` onto a category.
    pub fn from_draw(draw: f64) -> Self {
        Self::TABLE
            .iter()
            .find(|(bound, _)| draw < *bound)
            .map(|(_, weather)| *weather)
            .unwrap_or(Weather::Snow)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Rain => "rain",
            Weather::Fog => "fog",
            Weather::Storm => "storm",
            Weather::Snow => "snow",
        }
    }
}

impl std::fmt::Display for Weather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of the day/night cycle containing `tick`.
pub fn cycle_index(tick: u64, cycle_length: u64) -> u64 {
    tick / cycle_length.max(2)
}

/// Phase at `tick`: the first half of every cycle is day.
pub fn time_phase(tick: u64, cycle_length: u64) -> TimePhase {
    let cycle_length = cycle_length.max(2);
    if tick % cycle_length < cycle_length / 2 {
        TimePhase::Day
    } else {
        TimePhase::Night
    }
}

/// Weather for the cycle containing `tick`.
pub fn weather(seed: &str, tick: u64, cycle_length: u64) -> Weather {
    let cycle = cycle_index(tick, cycle_length);
    let mut rng = StoryRng::from_key(&format!("{seed}:weather:{cycle}"));
    Weather::from_draw(rng.next_float())
}
