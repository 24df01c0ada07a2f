//! Choice eligibility.
//!
//! Every predicate in a [`Requirement`] must hold for the choice to be
//! offered. Usage limits are counted in scope-keyed buckets on the player
//! state; see [`crate::state::scope_key`].

use serde::{Deserialize, Serialize};

use crate::clock::TimePhase;
use crate::config::EngineConfig;
use crate::state::{scope_key, PlayerState, Stat, UsageScope};

/// At most `max` uses of `id` within a scope window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimit {
    pub id: String,
    pub scope: UsageScope,
    pub max: u32,
}

/// Gate on a choice. All present predicates are ANDed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Requirement {
    /// Minimum coins, inclusive.
    pub coins: Option<i32>,
    /// Minimum hp, inclusive.
    pub hp: Option<i32>,
    /// Minimum karma, inclusive.
    pub karma: Option<i32>,
    /// Items that must all be held.
    pub items: Vec<String>,
    /// Required phase of the day.
    pub time: Option<TimePhase>,
    /// Usable once per phase of each cycle.
    pub phase_once: Option<String>,
    pub limit: Option<UsageLimit>,
}

/// A usage bucket touched by a requirement: scope key and its ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageBucket {
    pub key: String,
    pub max: u32,
}

impl Requirement {
    /// Buckets this requirement draws from at the state's current tick.
    /// Malformed limits (empty id) yield `None` so the caller can treat the
    /// requirement as unmet.
    pub fn usage_buckets(
        &self,
        state: &PlayerState,
        config: &EngineConfig,
    ) -> Option<Vec<UsageBucket>> {
        let cycle_length = config.effective_cycle_length();
        let mut buckets = Vec::new();

        if let Some(id) = &self.phase_once {
            if id.is_empty() {
                return None;
            }
            buckets.push(UsageBucket {
                key: scope_key(id, UsageScope::Phase, state.tick, cycle_length),
                max: 1,
            });
        }

        if let Some(limit) = &self.limit {
            if limit.id.is_empty() {
                return None;
            }
            buckets.push(UsageBucket {
                key: scope_key(&limit.id, limit.scope, state.tick, cycle_length),
                max: limit.max,
            });
        }

        Some(buckets)
    }

    /// True if the requirement counts usage at all.
    pub fn is_limited(&self) -> bool {
        self.phase_once.is_some() || self.limit.is_some()
    }
}

/// Decide whether a choice with this requirement is currently eligible.
/// An absent requirement is always met.
pub fn meets(state: &PlayerState, require: Option<&Requirement>, config: &EngineConfig) -> bool {
    let Some(require) = require else {
        return true;
    };

    let thresholds = [
        (Stat::Coins, require.coins),
        (Stat::Hp, require.hp),
        (Stat::Karma, require.karma),
    ];
    if thresholds
        .iter()
        .any(|(stat, min)| min.is_some_and(|min| state.stat(*stat) < min))
    {
        return false;
    }

    if !require.items.iter().all(|item| state.has_item(item)) {
        return false;
    }

    if require.time.is_some_and(|time| time != state.time) {
        return false;
    }

    match require.usage_buckets(state, config) {
        Some(buckets) => buckets
            .iter()
            .all(|bucket| state.uses_of(&bucket.key) < bucket.max),
        None => {
            tracing::warn!(node = %state.node, "malformed usage limit treated as unmet");
            false
        }
    }
}

/// Small typed predicate over player state, used for branching edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    AtLeast { stat: Stat, value: i32 },
    Below { stat: Stat, value: i32 },
    HasItem(String),
    Phase(TimePhase),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn at_least(stat: Stat, value: i32) -> Self {
        Condition::AtLeast { stat, value }
    }

    pub fn below(stat: Stat, value: i32) -> Self {
        Condition::Below { stat, value }
    }

    pub fn has_item(item: impl Into<String>) -> Self {
        Condition::HasItem(item.into())
    }

    pub fn evaluate(&self, state: &PlayerState) -> bool {
        match self {
            Condition::AtLeast { stat, value } => state.stat(*stat) >= *value,
            Condition::Below { stat, value } => state.stat(*stat) < *value,
            Condition::HasItem(item) => state.has_item(item),
            Condition::Phase(phase) => state.time == *phase,
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(state)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.evaluate(state)),
            Condition::Not(condition) => !condition.evaluate(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (EngineConfig, PlayerState) {
        let config = EngineConfig::default();
        let state = PlayerState::new(&config, "abc");
        (config, state)
    }

    #[test]
    fn test_absent_requirement_always_met() {
        let (config, state) = setup();
        assert!(meets(&state, None, &config));
        assert!(meets(&state, Some(&Requirement::default()), &config));
    }

    #[test]
    fn test_coin_threshold() {
        let (config, mut state) = setup();
        state.coins = 1;
        let require = Requirement {
            coins: Some(2),
            ..Default::default()
        };
        assert!(!meets(&state, Some(&require), &config));

        state.coins = 2;
        assert!(meets(&state, Some(&require), &config));
    }

    #[test]
    fn test_hp_and_karma_thresholds() {
        let (config, mut state) = setup();
        let require = Requirement {
            hp: Some(3),
            karma: Some(-1),
            ..Default::default()
        };
        assert!(meets(&state, Some(&require), &config));

        state.karma = -2;
        assert!(!meets(&state, Some(&require), &config));
    }

    #[test]
    fn test_items_all_required() {
        let (config, mut state) = setup();
        let require = Requirement {
            items: vec!["torch".into(), "rope".into()],
            ..Default::default()
        };
        state.items.insert("torch".into(), true);
        assert!(!meets(&state, Some(&require), &config));

        state.items.insert("rope".into(), true);
        assert!(meets(&state, Some(&require), &config));
    }

    #[test]
    fn test_time_match() {
        let (config, mut state) = setup();
        let require = Requirement {
            time: Some(TimePhase::Night),
            ..Default::default()
        };
        assert!(!meets(&state, Some(&require), &config));

        state.advance_ticks(4, &config);
        assert!(meets(&state, Some(&require), &config));
    }

    #[test]
    fn test_phase_once_bucket() {
        let (config, mut state) = setup();
        let require = Requirement {
            phase_once: Some("rest".into()),
            ..Default::default()
        };
        assert!(meets(&state, Some(&require), &config));

        state.uses.insert("rest:phase:day:0".into(), 1);
        assert!(!meets(&state, Some(&require), &config));

        state.advance_ticks(4, &config);
        assert!(meets(&state, Some(&require), &config));
    }

    #[test]
    fn test_limit_run_scope() {
        let (config, mut state) = setup();
        let require = Requirement {
            limit: Some(UsageLimit {
                id: "shrine".into(),
                scope: UsageScope::Run,
                max: 2,
            }),
            ..Default::default()
        };
        state.uses.insert("shrine:run".into(), 1);
        assert!(meets(&state, Some(&require), &config));

        state.uses.insert("shrine:run".into(), 2);
        assert!(!meets(&state, Some(&require), &config));

        state.advance_ticks(100, &config);
        assert!(!meets(&state, Some(&require), &config));
    }

    #[test]
    fn test_limit_cycle_scope() {
        let (config, mut state) = setup();
        let require = Requirement {
            limit: Some(UsageLimit {
                id: "well".into(),
                scope: UsageScope::Cycle,
                max: 1,
            }),
            ..Default::default()
        };
        assert!(meets(&state, Some(&require), &config));

        state.uses.insert("well:cycle:0".into(), 1);
        assert!(!meets(&state, Some(&require), &config));

        // Night of the same cycle still counts against the limit.
        state.advance_ticks(4, &config);
        assert_eq!(state.time, TimePhase::Night);
        assert!(!meets(&state, Some(&require), &config));

        state.advance_ticks(4, &config);
        assert_eq!(state.cycle(&config), 1);
        assert!(meets(&state, Some(&require), &config));
    }

    #[test]
    fn test_malformed_limit_is_unmet() {
        let (config, state) = setup();
        let require = Requirement {
            limit: Some(UsageLimit {
                id: String::new(),
                scope: UsageScope::Cycle,
                max: 5,
            }),
            ..Default::default()
        };
        assert!(!meets(&state, Some(&require), &config));
    }

    #[test]
    fn test_requirement_from_toml() {
        let require: Requirement = toml::from_str(
            r#"
            coins = 2
            items = ["torch"]
            time = "night"
            limit = { id = "well", scope = "cycle", max = 1 }
            "#,
        )
        .unwrap();
        assert_eq!(require.coins, Some(2));
        assert_eq!(require.time, Some(TimePhase::Night));
        assert_eq!(require.limit.unwrap().scope, UsageScope::Cycle);
    }

    #[test]
    fn test_conditions() {
        let (_, mut state) = setup();
        state.karma = 2;
        state.items.insert("crown".into(), true);

        assert!(Condition::at_least(Stat::Karma, 2).evaluate(&state));
        assert!(!Condition::below(Stat::Karma, 2).evaluate(&state));
        assert!(Condition::All(vec![
            Condition::has_item("crown"),
            Condition::Phase(TimePhase::Day),
        ])
        .evaluate(&state));
        assert!(Condition::Any(vec![
            Condition::has_item("sword"),
            Condition::at_least(Stat::Hp, 1),
        ])
        .evaluate(&state));
        assert!(Condition::Not(Box::new(Condition::has_item("sword"))).evaluate(&state));
    }
}
