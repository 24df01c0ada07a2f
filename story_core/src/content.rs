//! Bundled demo story.

use story_rules::{RulesError, StoryGraph};

/// TOML source of "The Lantern Road".
pub const LANTERN_ROAD: &str = include_str!("../content/lantern_road.toml");

/// Parse the bundled story.
pub fn lantern_road() -> Result<StoryGraph, RulesError> {
    StoryGraph::from_toml_str(LANTERN_ROAD)
}
