//! Save codec.
//!
//! A save keeps the game fields plus a short "lite" trail: the most recent
//! history entries without their snapshots. That is enough to show where
//! the player has been but not to undo across a reload. Presentation
//! counters are never saved.
//!
//! Decoding is lenient. The blob is merged field by field onto a fresh
//! initial state, so a missing or malformed field keeps its default
//! instead of discarding the whole save.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use story_rules::{new_seed, EngineConfig, HistoryEntry, NodeId, PlayerState, TimePhase};

/// Errors from encoding or decoding a save blob.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save blob is not a JSON object")]
    NotAnObject,
}

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Persisted form of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveBlob {
    pub version: u32,
    pub node: NodeId,
    pub hp: i32,
    pub coins: i32,
    pub karma: i32,
    pub items: BTreeMap<String, bool>,
    /// Lite trail: no snapshots.
    pub history: Vec<HistoryEntry>,
    pub seed: String,
    pub tick: u64,
    pub time: TimePhase,
    pub uses: BTreeMap<String, u32>,
}

impl SaveBlob {
    /// Trim a live state down to its persisted form.
    pub fn from_state(state: &PlayerState, config: &EngineConfig) -> Self {
        let keep = config.saved_history_limit;
        let skip = state.history.len().saturating_sub(keep);
        let history = state
            .history
            .iter()
            .skip(skip)
            .map(|entry| HistoryEntry {
                snapshot: None,
                ..entry.clone()
            })
            .collect();

        Self {
            version: SAVE_VERSION,
            node: state.node.clone(),
            hp: state.hp,
            coins: state.coins,
            karma: state.karma,
            items: state.items.clone(),
            history,
            seed: state.seed.clone(),
            tick: state.tick,
            time: state.time,
            uses: state.uses.clone(),
        }
    }
}

/// Serialize a state to a JSON save blob.
pub fn encode(state: &PlayerState, config: &EngineConfig) -> Result<String, SaveError> {
    Ok(serde_json::to_string(&SaveBlob::from_state(state, config))?)
}

/// Rebuild a state from a save blob.
///
/// Only a blob that is not JSON, or not a JSON object, is an error. Every
/// other defect falls back to the default for that field. Stats are
/// re-clamped, the phase is re-derived from the tick, and the trail is cut
/// to the saved length without snapshots.
pub fn decode(text: &str, config: &EngineConfig) -> Result<PlayerState, SaveError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(map) = value else {
        return Err(SaveError::NotAnObject);
    };

    if let Some(version) = field::<u32>(&map, "version") {
        if version != SAVE_VERSION {
            tracing::warn!(expected = SAVE_VERSION, found = version, "save version mismatch");
        }
    }

    let seed = field::<String>(&map, "seed").unwrap_or_else(new_seed);
    let mut state = PlayerState::new(config, seed);

    if let Some(node) = field(&map, "node") {
        state.node = node;
    }
    if let Some(hp) = field::<i64>(&map, "hp") {
        state.hp = config.clamp_stat(hp);
    }
    if let Some(coins) = field::<i64>(&map, "coins") {
        state.coins = config.clamp_stat(coins);
    }
    if let Some(karma) = field::<i64>(&map, "karma") {
        state.karma = config.clamp_stat(karma);
    }
    if let Some(items) = field(&map, "items") {
        state.items = items;
    }
    if let Some(uses) = field(&map, "uses") {
        state.uses = uses;
    }
    if let Some(tick) = field(&map, "tick") {
        state.tick = tick;
    }
    if let Some(history) = field::<Vec<HistoryEntry>>(&map, "history") {
        let skip = history.len().saturating_sub(config.saved_history_limit);
        state.history = history
            .into_iter()
            .skip(skip)
            .map(|entry| HistoryEntry {
                snapshot: None,
                ..entry
            })
            .collect();
    }

    state.sync_time(config);
    Ok(state)
}

/// Read one field, treating a malformed value as absent.
fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(field = key, error = %err, "ignoring malformed save field");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn played_state(config: &EngineConfig, steps: usize) -> PlayerState {
        let mut state = PlayerState::new(config, "abc");
        for i in 0..steps {
            let snapshot = state.snapshot();
            state.history.push(HistoryEntry {
                node: NodeId::new(format!("n{i}")),
                choice_text: format!("choice {i}"),
                at: i as u64,
                snapshot: Some(snapshot),
            });
            state.advance_ticks(1, config);
        }
        state
    }

    #[test]
    fn test_encode_trims_history_and_fx() {
        let config = config();
        let mut state = played_state(&config, 45);
        state.fx.hit_flash = 3;
        state.fx.cues.push("damage".into());

        let blob: Value = serde_json::from_str(&encode(&state, &config).unwrap()).unwrap();
        let history = blob["history"].as_array().unwrap();

        assert_eq!(history.len(), 30);
        assert_eq!(history[0]["node"], "n15");
        assert_eq!(history[29]["node"], "n44");
        assert!(history.iter().all(|e| e.get("snapshot").is_none()));
        assert!(blob.get("fx").is_none());
        assert_eq!(blob["time"], "night");
    }

    #[test]
    fn test_decode_restores_game_fields() {
        let config = config();
        let mut state = played_state(&config, 5);
        state.coins = 12;
        state.items.insert("torch".into(), true);
        state.uses.insert("rest:run".into(), 1);
        state.fx.omen_pulse = 2;

        let decoded = decode(&encode(&state, &config).unwrap(), &config).unwrap();

        assert_eq!(decoded.coins, 12);
        assert_eq!(decoded.seed, "abc");
        assert_eq!(decoded.tick, 5);
        assert_eq!(decoded.time, state.time);
        assert_eq!(decoded.items, state.items);
        assert_eq!(decoded.uses, state.uses);
        assert_eq!(decoded.history.len(), 5);
        assert!(decoded.history.iter().all(|e| e.snapshot.is_none()));
        assert!(decoded.fx.is_idle());
    }

    #[test]
    fn test_decode_merges_onto_defaults() {
        let config = config();
        let decoded = decode(r#"{"coins": 7, "hp": "lots", "tick": -3}"#, &config).unwrap();

        assert_eq!(decoded.coins, 7);
        assert_eq!(decoded.hp, 5);
        assert_eq!(decoded.tick, 0);
        assert_eq!(decoded.node.as_str(), "start");
        assert!(!decoded.seed.is_empty());
    }

    #[test]
    fn test_decode_clamps_and_rederives_time() {
        let config = config();
        let decoded = decode(
            r#"{"hp": 5000, "karma": -5000, "tick": 13, "time": "day"}"#,
            &config,
        )
        .unwrap();

        assert_eq!(decoded.hp, 99);
        assert_eq!(decoded.karma, -99);
        assert_eq!(decoded.time, TimePhase::Night);
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        let config = config();
        assert!(matches!(decode("[1, 2]", &config), Err(SaveError::NotAnObject)));
        assert!(matches!(decode("not json", &config), Err(SaveError::Json(_))));
    }

    #[test]
    fn test_decode_strips_smuggled_snapshots() {
        let config = config();
        let mut state = played_state(&config, 2);
        state.history[0].snapshot = Some(state.snapshot());
        let raw = serde_json::json!({
            "history": serde_json::to_value(&state.history).unwrap(),
        });

        let decoded = decode(&raw.to_string(), &config).unwrap();
        assert_eq!(decoded.history.len(), 2);
        assert!(decoded.history.iter().all(|e| e.snapshot.is_none()));
    }
}
