//! Player state - the single live record of a run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::clock::{self, TimePhase};
use crate::config::EngineConfig;

/// Identifier of a story node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric player stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Hp,
    Coins,
    Karma,
}

impl Stat {
    pub const ALL: [Stat; 3] = [Stat::Hp, Stat::Coins, Stat::Karma];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Hp => "hp",
            Stat::Coins => "coins",
            Stat::Karma => "karma",
        }
    }
}

/// Window over which a usage limit counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageScope {
    /// Resets whenever day turns to night or back.
    Phase,
    /// Resets at the start of every day/night cycle.
    Cycle,
    /// Never resets.
    Run,
}

/// Composite key of a usage bucket. The key embeds the current window so
/// counters reset on their own as time advances.
pub fn scope_key(id: &str, scope: UsageScope, tick: u64, cycle_length: u64) -> String {
    let cycle = clock::cycle_index(tick, cycle_length);
    match scope {
        UsageScope::Phase => {
            let phase = clock::time_phase(tick, cycle_length);
            format!("{id}:phase:{phase}:{cycle}")
        }
        UsageScope::Cycle => format!("{id}:cycle:{cycle}"),
        UsageScope::Run => format!("{id}:run"),
    }
}

/// A fresh random run seed.
pub fn new_seed() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Presentation-facing counters. Not part of game logic and reset on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Fx {
    /// Bumped every time hp drops.
    pub hit_flash: u32,
    /// Bumped on arrival at a random-event node.
    pub omen_pulse: u32,
    /// Queued cue tags awaiting the presentation layer.
    pub cues: Vec<String>,
}

impl Fx {
    pub fn is_idle(&self) -> bool {
        self.hit_flash == 0 && self.omen_pulse == 0 && self.cues.is_empty()
    }
}

/// Copy of every game field except `history` and `fx`, taken before a
/// transition so it can be undone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub node: NodeId,
    pub hp: i32,
    pub coins: i32,
    pub karma: i32,
    pub items: BTreeMap<String, bool>,
    pub seed: String,
    pub tick: u64,
    pub time: TimePhase,
    pub uses: BTreeMap<String, u32>,
}

/// One step of the trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Node the choice was taken from.
    pub node: NodeId,
    pub choice_text: String,
    /// Wall-clock milliseconds when the choice was taken.
    pub at: u64,
    /// Full pre-choice state. Absent on entries restored from a save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
}

/// The live state of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub node: NodeId,
    pub hp: i32,
    pub coins: i32,
    pub karma: i32,
    pub items: BTreeMap<String, bool>,
    pub history: Vec<HistoryEntry>,
    pub seed: String,
    pub tick: u64,
    pub time: TimePhase,
    pub uses: BTreeMap<String, u32>,
    #[serde(default)]
    pub fx: Fx,
}

impl PlayerState {
    /// Initial state of a run with the given seed.
    pub fn new(config: &EngineConfig, seed: impl Into<String>) -> Self {
        Self {
            node: NodeId::new(config.start.node.clone()),
            hp: config.clamp_stat(config.start.hp as i64),
            coins: config.clamp_stat(config.start.coins as i64),
            karma: config.clamp_stat(config.start.karma as i64),
            items: BTreeMap::new(),
            history: Vec::new(),
            seed: seed.into(),
            tick: 0,
            time: clock::time_phase(0, config.effective_cycle_length()),
            uses: BTreeMap::new(),
            fx: Fx::default(),
        }
    }

    /// Initial state with a freshly rolled seed.
    pub fn fresh(config: &EngineConfig) -> Self {
        Self::new(config, new_seed())
    }

    pub fn stat(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Coins => self.coins,
            Stat::Karma => self.karma,
        }
    }

    /// Add `delta` to a stat, clamped to the configured bounds.
    pub fn add_stat(&mut self, stat: Stat, delta: i32, config: &EngineConfig) {
        let slot = match stat {
            Stat::Hp => &mut self.hp,
            Stat::Coins => &mut self.coins,
            Stat::Karma => &mut self.karma,
        };
        *slot = config.clamp_stat(*slot as i64 + delta as i64);
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.items.get(item).copied().unwrap_or(false)
    }

    /// Usage count recorded under a scope key.
    pub fn uses_of(&self, key: &str) -> u32 {
        self.uses.get(key).copied().unwrap_or(0)
    }

    pub fn cycle(&self, config: &EngineConfig) -> u64 {
        clock::cycle_index(self.tick, config.effective_cycle_length())
    }

    /// Recompute `time` from `tick`.
    pub fn sync_time(&mut self, config: &EngineConfig) {
        self.time = clock::time_phase(self.tick, config.effective_cycle_length());
    }

    /// Advance the clock by `steps` ticks.
    pub fn advance_ticks(&mut self, steps: u64, config: &EngineConfig) {
        self.tick = self.tick.saturating_add(steps);
        self.sync_time(config);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            node: self.node.clone(),
            hp: self.hp,
            coins: self.coins,
            karma: self.karma,
            items: self.items.clone(),
            seed: self.seed.clone(),
            tick: self.tick,
            time: self.time,
            uses: self.uses.clone(),
        }
    }

    /// Overwrite every snapshotted field. `history` and `fx` are untouched.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.node = snapshot.node;
        self.hp = snapshot.hp;
        self.coins = snapshot.coins;
        self.karma = snapshot.karma;
        self.items = snapshot.items;
        self.seed = snapshot.seed;
        self.tick = snapshot.tick;
        self.time = snapshot.time;
        self.uses = snapshot.uses;
    }
}
