//! Transition engine - computes the next state for a chosen edge.
//!
//! The algorithm runs in a fixed order:
//! 1. **Snapshot** the current state for undo
//! 2. **Effects**: add clamped stat deltas, merge items, classify changes
//! 3. **Destination**: resolve the edge against the post-effect state
//! 4. **Bonus**: leaving a random-event node may drop one coin
//! 5. **Usage**: bump every usage bucket the requirement draws from
//! 6. **Move** to the destination
//! 7. **Tick** the clock and re-derive the phase
//! 8. **Record** the snapshot on the bounded history
//!
//! Transitions are pure: the input state is never touched and the result is
//! either a complete new state or nothing.

use story_rules::{
    clock, Choice, EngineConfig, HistoryEntry, NodeId, PlayerState, Stat, StoryGraph, StoryNode,
    StoryRng,
};

use crate::events::EventTag;
use crate::history::push_bounded;

/// Everything a transition reads besides the state itself.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub graph: &'a StoryGraph,
    pub config: &'a EngineConfig,
    /// Wall-clock milliseconds stamped on the history entry.
    pub now: u64,
}

/// Result of applying a choice or advancing time.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PlayerState,
    /// Tags raised by this step, in emission order.
    pub events: Vec<EventTag>,
}

/// Apply `choice` to `state`.
pub fn apply_choice(
    ctx: &TransitionContext<'_>,
    state: &PlayerState,
    choice: &Choice,
) -> Transition {
    let config = ctx.config;
    let snapshot = state.snapshot();
    let mut next = state.clone();
    let mut events = Vec::new();

    if let Some(set) = &choice.set {
        for stat in Stat::ALL {
            let before = next.stat(stat);
            next.add_stat(stat, set.delta(stat), config);
            events.extend(classify(stat, before, next.stat(stat)));
        }
        if next.hp < state.hp {
            next.fx.hit_flash += 1;
        }
        for (item, present) in &set.items {
            let had = next.has_item(item);
            next.items.insert(item.clone(), *present);
            if *present && !had {
                events.push(EventTag::Collect(item.clone()));
            }
        }
    }

    let destination = resolve_destination(ctx.graph, &next, choice);

    if ctx.graph.get(&state.node).is_some_and(|node| node.random_event) {
        let mut rng = StoryRng::from_key(&format!("{}:{}", state.seed, state.tick));
        if rng.chance(config.event_bonus_chance) {
            next.add_stat(Stat::Coins, 1, config);
            events.push(EventTag::Bonus);
        }
    }

    if let Some(require) = choice.require.as_ref().filter(|r| r.is_limited()) {
        for bucket in require.usage_buckets(state, config).unwrap_or_default() {
            *next.uses.entry(bucket.key).or_insert(0) += 1;
        }
    }

    let arrived = destination != state.node;
    next.node = destination;

    next.advance_ticks(1, config);
    events.extend(weather_change(state, &next, config));

    if arrived {
        if let Some(node) = ctx.graph.get(&next.node) {
            events.extend(arrival_events(node, &mut next));
        }
    }

    push_bounded(
        &mut next.history,
        HistoryEntry {
            node: state.node.clone(),
            choice_text: choice.text.clone(),
            at: ctx.now,
            snapshot: Some(snapshot),
        },
        config.history_limit,
    );

    next.fx.cues.extend(events.iter().map(EventTag::as_tag));

    tracing::debug!(
        from = %state.node,
        to = %next.node,
        tick = next.tick,
        hp = next.hp,
        coins = next.coins,
        karma = next.karma,
        choice = %choice.text,
        "choice applied"
    );

    Transition {
        state: next,
        events,
    }
}

/// Let `steps` ticks pass without moving. No history entry is recorded.
pub fn advance_time(config: &EngineConfig, state: &PlayerState, steps: u64) -> Transition {
    let mut next = state.clone();
    next.advance_ticks(steps, config);
    let events: Vec<EventTag> = weather_change(state, &next, config).into_iter().collect();
    next.fx.cues.extend(events.iter().map(EventTag::as_tag));

    tracing::debug!(node = %next.node, tick = next.tick, time = %next.time, "time advanced");

    Transition {
        state: next,
        events,
    }
}

/// Follow the choice's edge. Dangling targets and edgeless choices stay put.
fn resolve_destination(graph: &StoryGraph, state: &PlayerState, choice: &Choice) -> NodeId {
    let Some(to) = &choice.to else {
        return state.node.clone();
    };

    let target = to.resolve(state);
    if graph.contains(target) {
        target.clone()
    } else {
        tracing::warn!(
            from = %state.node,
            target = %target,
            "choice leads to unknown node; staying put"
        );
        state.node.clone()
    }
}

fn classify(stat: Stat, before: i32, after: i32) -> Option<EventTag> {
    use std::cmp::Ordering;

    match (stat, after.cmp(&before)) {
        (_, Ordering::Equal) => None,
        (Stat::Hp, Ordering::Less) => Some(EventTag::Damage),
        (Stat::Hp, Ordering::Greater) => Some(EventTag::Heal),
        (Stat::Coins, Ordering::Less) => Some(EventTag::Spend),
        (Stat::Coins, Ordering::Greater) => Some(EventTag::Gain),
        (Stat::Karma, Ordering::Less) => Some(EventTag::KarmaDown),
        (Stat::Karma, Ordering::Greater) => Some(EventTag::KarmaUp),
    }
}

fn arrival_events(node: &StoryNode, next: &mut PlayerState) -> Vec<EventTag> {
    let mut events = Vec::new();
    if node.random_event {
        next.fx.omen_pulse += 1;
        events.push(EventTag::Omen);
    }
    if let Some(cue) = &node.cue {
        events.push(EventTag::Cue(cue.clone()));
    }
    if let Some(ending) = node.ending {
        events.push(EventTag::Ending(ending));
    }
    events
}

/// Raised when the clock crosses into a cycle whose weather differs.
fn weather_change(
    before: &PlayerState,
    after: &PlayerState,
    config: &EngineConfig,
) -> Option<EventTag> {
    let cycle_length = config.effective_cycle_length();
    if clock::cycle_index(before.tick, cycle_length) == clock::cycle_index(after.tick, cycle_length)
    {
        return None;
    }
    let old = clock::weather(&before.seed, before.tick, cycle_length);
    let new = clock::weather(&after.seed, after.tick, cycle_length);
    (old != new).then_some(EventTag::Weather(new))
}
