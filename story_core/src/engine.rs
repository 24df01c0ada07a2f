//! Story engine - the single writer of player state.
//!
//! The engine owns the story graph, the live [`PlayerState`], and the save
//! store. Presentation calls in with discrete actions (choose, wait, undo,
//! restart) and reads back a [`NodeView`] plus drained [`EventTag`]s.
//! Every action persists the new state; persistence failures are logged
//! and otherwise ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use story_rules::{
    clock, meets, new_seed, Choice, EndingKind, EngineConfig, NodeId, PlayerState, RulesError,
    StoryGraph, StoryNode, TimePhase, Weather,
};

use crate::events::EventTag;
use crate::history::{self, SystemClock, WallClock};
use crate::save;
use crate::storage::{MemoryStore, SaveStore};
use crate::text;
use crate::transition::{self, Transition, TransitionContext};

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller picked a choice that is not offered right now.
    #[error("choice {index} is not available at node '{node}'")]
    ChoiceUnavailable { node: NodeId, index: usize },

    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// An eligible choice as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceView {
    /// Position in the node's full choice list; pass back to `choose`.
    pub index: usize,
    pub text: String,
}

/// Everything presentation needs to draw the current scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub title: String,
    /// Text with placeholders filled in.
    pub text: String,
    pub random_event: bool,
    pub ending: Option<EndingKind>,
    pub choices: Vec<ChoiceView>,
    pub time: TimePhase,
    pub weather: Weather,
}

/// Drives a single run through a story graph.
pub struct StoryEngine {
    graph: StoryGraph,
    config: EngineConfig,
    state: PlayerState,
    store: Box<dyn SaveStore>,
    clock: Box<dyn WallClock>,
}

impl StoryEngine {
    /// Start a fresh run with a random seed, an in-memory store and the
    /// system clock. Fails only if the start node is missing.
    pub fn new(graph: StoryGraph, config: EngineConfig) -> Result<Self, EngineError> {
        let config = config.normalized();
        graph.check_start(&config.start.node)?;
        for issue in graph.validate() {
            tracing::warn!(%issue, "story content issue");
        }

        let state = PlayerState::fresh(&config);
        Ok(Self {
            graph,
            config,
            state,
            store: Box::new(MemoryStore::new()),
            clock: Box::new(SystemClock),
        })
    }

    pub fn with_store(mut self, store: impl SaveStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_clock(mut self, clock: impl WallClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the current run with a fresh one using `seed`.
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.state = PlayerState::new(&self.config, seed);
        self
    }

    /// Resume from the store if it holds a usable save. Returns whether a
    /// save was loaded; on any failure the current run is kept.
    pub fn resume(&mut self) -> bool {
        let blob = match self.store.load() {
            Ok(Some(blob)) => blob,
            Ok(None) => return false,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read save; starting fresh");
                return false;
            }
        };

        match save::decode(&blob, &self.config) {
            Ok(mut state) => {
                if !self.graph.contains(&state.node) {
                    tracing::warn!(node = %state.node, "saved node no longer exists; using start");
                    state.node = NodeId::new(self.config.start.node.clone());
                }
                tracing::info!(node = %state.node, tick = state.tick, "resumed saved run");
                self.state = state;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable save");
                false
            }
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_node(&self) -> Option<&StoryNode> {
        self.graph.get(&self.state.node)
    }

    /// Weather for the current cycle.
    pub fn weather(&self) -> Weather {
        clock::weather(
            &self.state.seed,
            self.state.tick,
            self.config.effective_cycle_length(),
        )
    }

    /// Choices at the current node that pass their requirements, paired
    /// with their index in the node's choice list.
    pub fn available_choices(&self) -> Vec<(usize, &Choice)> {
        self.current_node()
            .map(|node| {
                node.choices
                    .iter()
                    .enumerate()
                    .filter(|(_, choice)| {
                        meets(&self.state, choice.require.as_ref(), &self.config)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render the current node. An unknown node shows as "unknown" with no
    /// way out other than undo or restart.
    pub fn view(&self) -> NodeView {
        let choices = self
            .available_choices()
            .into_iter()
            .map(|(index, choice)| ChoiceView {
                index,
                text: choice.text.clone(),
            })
            .collect();

        let (title, text, random_event, ending) = match self.current_node() {
            Some(node) => (
                node.title.clone(),
                text::render(&node.text, &self.state, &self.config),
                node.random_event,
                node.ending,
            ),
            None => ("unknown".to_string(), String::new(), false, None),
        };

        NodeView {
            id: self.state.node.clone(),
            title,
            text,
            random_event,
            ending,
            choices,
            time: self.state.time,
            weather: self.weather(),
        }
    }

    /// True once the run sits on an ending node.
    pub fn is_ended(&self) -> bool {
        self.current_node().is_some_and(StoryNode::is_ending)
    }

    /// Take the choice at `index` in the current node's choice list.
    pub fn choose(&mut self, index: usize) -> Result<Vec<EventTag>, EngineError> {
        let unavailable = || EngineError::ChoiceUnavailable {
            node: self.state.node.clone(),
            index,
        };

        let choice = self
            .current_node()
            .and_then(|node| node.choices.get(index))
            .filter(|choice| meets(&self.state, choice.require.as_ref(), &self.config))
            .ok_or_else(unavailable)?;

        let ctx = TransitionContext {
            graph: &self.graph,
            config: &self.config,
            now: self.clock.now_millis(),
        };
        let Transition { state, events } = transition::apply_choice(&ctx, &self.state, choice);

        self.state = state;
        self.persist();
        Ok(events)
    }

    /// Let `steps` ticks pass in place.
    pub fn advance_time(&mut self, steps: u64) -> Vec<EventTag> {
        let Transition { state, events } =
            transition::advance_time(&self.config, &self.state, steps);
        self.state = state;
        self.persist();
        events
    }

    /// Rewind the last choice. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !history::can_undo(&self.state) {
            return false;
        }
        self.state = history::undo(&self.state);
        self.state.fx.cues.clear();
        self.persist();
        true
    }

    /// Start over. A hard restart also wipes the save and rolls a new seed.
    pub fn restart(&mut self, hard: bool) {
        let seed = if hard {
            if let Err(err) = self.store.clear() {
                tracing::warn!(error = %err, "failed to clear save");
            }
            new_seed()
        } else {
            self.state.seed.clone()
        };

        tracing::info!(hard, seed = %seed, "run restarted");
        self.state = PlayerState::new(&self.config, seed);
        self.persist();
    }

    /// Take every queued event tag, oldest first.
    pub fn drain_events(&mut self) -> Vec<EventTag> {
        std::mem::take(&mut self.state.fx.cues)
            .iter()
            .filter_map(|tag| EventTag::from_tag(tag))
            .collect()
    }

    fn persist(&mut self) {
        let blob = match save::encode(&self.state, &self.config) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode save");
                return;
            }
        };
        if let Err(err) = self.store.save(&blob) {
            tracing::warn!(error = %err, "failed to write save");
        }
    }
}
