//! Story graph - immutable narrative content.
//!
//! Nodes and choices are plain data, authored in TOML and loaded once at
//! startup. Conditional routing is expressed with typed [`Destination`]
//! branches instead of executable callbacks.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::RulesError;
use crate::requirements::{Condition, Requirement};
use crate::state::{NodeId, PlayerState, Stat};

/// How a story ends at an ending node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndingKind {
    Victory,
    Defeat,
    Neutral,
}

/// Stat and item changes applied when a choice is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Effect {
    pub hp: i32,
    pub coins: i32,
    pub karma: i32,
    /// Shallow-merged into the player's items.
    pub items: BTreeMap<String, bool>,
}

impl Effect {
    pub fn delta(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Coins => self.coins,
            Stat::Karma => self.karma,
        }
    }
}

/// Where a choice leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Destination {
    Node(NodeId),
    Branch {
        when: Condition,
        then: Box<Destination>,
        otherwise: Box<Destination>,
    },
}

impl Destination {
    pub fn node(id: impl Into<String>) -> Self {
        Destination::Node(NodeId::new(id))
    }

    pub fn branch(when: Condition, then: Destination, otherwise: Destination) -> Self {
        Destination::Branch {
            when,
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Follow branches against `state` down to a node id.
    pub fn resolve(&self, state: &PlayerState) -> &NodeId {
        match self {
            Destination::Node(id) => id,
            Destination::Branch {
                when,
                then,
                otherwise,
            } => {
                if when.evaluate(state) {
                    then.resolve(state)
                } else {
                    otherwise.resolve(state)
                }
            }
        }
    }

    /// Every node id this destination could reach.
    pub fn targets(&self) -> Vec<&NodeId> {
        match self {
            Destination::Node(id) => vec![id],
            Destination::Branch {
                then, otherwise, ..
            } => {
                let mut targets = then.targets();
                targets.extend(otherwise.targets());
                targets
            }
        }
    }
}

/// A player-selectable edge out of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub require: Option<Requirement>,
    #[serde(default)]
    pub set: Option<Effect>,
    /// Absent means the choice stays on the current node.
    #[serde(default)]
    pub to: Option<Destination>,
}

impl Choice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            require: None,
            set: None,
            to: None,
        }
    }

    pub fn to(mut self, destination: Destination) -> Self {
        self.to = Some(destination);
        self
    }

    pub fn with_require(mut self, require: Requirement) -> Self {
        self.require = Some(require);
        self
    }

    pub fn with_set(mut self, set: Effect) -> Self {
        self.set = Some(set);
        self
    }
}

/// A scene in the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: NodeId,
    pub title: String,
    /// Narrative text; may contain `{hp}`-style placeholders.
    #[serde(default)]
    pub text: String,
    /// Leaving this node may drop a bonus coin.
    #[serde(default)]
    pub random_event: bool,
    #[serde(default)]
    pub ending: Option<EndingKind>,
    /// Presentation cue emitted on arrival.
    #[serde(default)]
    pub cue: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl StoryNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            title: title.into(),
            text: String::new(),
            random_event: false,
            ending: None,
            cue: None,
            choices: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_random_event(mut self) -> Self {
        self.random_event = true;
        self
    }

    pub fn with_ending(mut self, ending: EndingKind) -> Self {
        self.ending = Some(ending);
        self
    }

    pub fn with_cue(mut self, cue: impl Into<String>) -> Self {
        self.cue = Some(cue.into());
        self
    }

    pub fn is_ending(&self) -> bool {
        self.ending.is_some()
    }
}

/// Authoring problem found in loaded content. None of these stop play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentIssue {
    DanglingDestination {
        node: NodeId,
        choice: usize,
        target: NodeId,
    },
    MalformedLimit {
        node: NodeId,
        choice: usize,
    },
}

impl std::fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentIssue::DanglingDestination {
                node,
                choice,
                target,
            } => write!(f, "{node}#{choice} leads to unknown node '{target}'"),
            ContentIssue::MalformedLimit { node, choice } => {
                write!(f, "{node}#{choice} has a usage limit without an id")
            }
        }
    }
}

#[derive(Deserialize)]
struct StoryFile {
    #[serde(default)]
    nodes: Vec<StoryNode>,
}

/// The full node graph.
#[derive(Debug, Clone, Default)]
pub struct StoryGraph {
    nodes: HashMap<NodeId, StoryNode>,
}

impl StoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from nodes, rejecting duplicate ids.
    pub fn from_nodes(nodes: impl IntoIterator<Item = StoryNode>) -> Result<Self, RulesError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        Ok(graph)
    }

    /// Parse a graph from TOML `[[nodes]]` tables.
    pub fn from_toml_str(text: &str) -> Result<Self, RulesError> {
        let file: StoryFile = toml::from_str(text)?;
        Self::from_nodes(file.nodes)
    }

    /// Load a graph from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn add_node(&mut self, node: StoryNode) -> Result<(), RulesError> {
        if self.nodes.contains_key(&node.id) {
            return Err(RulesError::DuplicateNode(node.id.0));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    pub fn get(&self, id: &NodeId) -> Option<&StoryNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StoryNode> {
        self.nodes.values()
    }

    /// Fail if the configured start node is missing.
    pub fn check_start(&self, start: &str) -> Result<(), RulesError> {
        if self.contains(&NodeId::from(start)) {
            Ok(())
        } else {
            Err(RulesError::MissingStart(start.to_string()))
        }
    }

    /// Collect authoring problems, sorted for stable reporting.
    pub fn validate(&self) -> Vec<ContentIssue> {
        let mut issues = Vec::new();

        for node in self.nodes.values() {
            for (index, choice) in node.choices.iter().enumerate() {
                if let Some(to) = &choice.to {
                    for target in to.targets() {
                        if !self.contains(target) {
                            issues.push(ContentIssue::DanglingDestination {
                                node: node.id.clone(),
                                choice: index,
                                target: target.clone(),
                            });
                        }
                    }
                }

                let malformed = choice.require.as_ref().is_some_and(|r| {
                    r.phase_once.as_deref() == Some("")
                        || r.limit.as_ref().is_some_and(|l| l.id.is_empty())
                });
                if malformed {
                    issues.push(ContentIssue::MalformedLimit {
                        node: node.id.clone(),
                        choice: index,
                    });
                }
            }
        }

        issues.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        issues
    }
}
