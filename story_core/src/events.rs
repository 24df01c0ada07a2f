//! Event tags emitted for the presentation layer.
//!
//! Tags carry no gameplay weight. The engine queues them on the player's
//! `fx` channel and the consumer drains them after rendering.

use serde::{Deserialize, Serialize};
use story_rules::{EndingKind, Weather};

/// A transient cue for sound or visual effects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum EventTag {
    Damage,
    Heal,
    Gain,
    Spend,
    KarmaUp,
    KarmaDown,
    /// An item flag turned true.
    Collect(String),
    /// A random-event node dropped a bonus coin.
    Bonus,
    /// Arrived at a random-event node.
    Omen,
    Ending(EndingKind),
    /// Node-authored cue, e.g. a creature sound.
    Cue(String),
    /// A new cycle started with different weather.
    Weather(Weather),
}

impl EventTag {
    /// Stable string form used on the `fx.cues` queue.
    pub fn as_tag(&self) -> String {
        match self {
            EventTag::Damage => "damage".to_string(),
            EventTag::Heal => "heal".to_string(),
            EventTag::Gain => "gain".to_string(),
            EventTag::Spend => "spend".to_string(),
            EventTag::KarmaUp => "karma_up".to_string(),
            EventTag::KarmaDown => "karma_down".to_string(),
            EventTag::Collect(item) => format!("collect:{item}"),
            EventTag::Bonus => "bonus".to_string(),
            EventTag::Omen => "omen".to_string(),
            EventTag::Ending(EndingKind::Victory) => "victory".to_string(),
            EventTag::Ending(EndingKind::Defeat) => "defeat".to_string(),
            EventTag::Ending(EndingKind::Neutral) => "ending".to_string(),
            EventTag::Cue(name) => format!("cue:{name}"),
            EventTag::Weather(weather) => format!("weather:{weather}"),
        }
    }

    /// Parse the string form back into a tag. Unknown strings are `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let parsed = match tag {
            "damage" => EventTag::Damage,
            "heal" => EventTag::Heal,
            "gain" => EventTag::Gain,
            "spend" => EventTag::Spend,
            "karma_up" => EventTag::KarmaUp,
            "karma_down" => EventTag::KarmaDown,
            "bonus" => EventTag::Bonus,
            "omen" => EventTag::Omen,
            "victory" => EventTag::Ending(EndingKind::Victory),
            "defeat" => EventTag::Ending(EndingKind::Defeat),
            "ending" => EventTag::Ending(EndingKind::Neutral),
            _ => {
                let (kind, value) = tag.split_once(':')?;
                match kind {
                    "collect" => EventTag::Collect(value.to_string()),
                    "cue" => EventTag::Cue(value.to_string()),
                    "weather" => EventTag::Weather(parse_weather(value)?),
                    _ => return None,
                }
            }
        };
        Some(parsed)
    }
}

fn parse_weather(value: &str) -> Option<Weather> {
    [
        Weather::Clear,
        Weather::Rain,
        Weather::Fog,
        Weather::Storm,
        Weather::Snow,
    ]
    .into_iter()
    .find(|w| w.as_str() == value)
}

impl std::fmt::Display for EventTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_tag())
    }
}
