//! End-to-end runs through the bundled story.

use story_core::content::lantern_road;
use story_core::history::undo;
use story_core::transition::{apply_choice, TransitionContext};
use story_core::{EventTag, FileStore, FixedClock, MemoryStore, SaveStore, StoryEngine};
use story_rules::{
    time_phase, Choice, Condition, Destination, Effect, EndingKind, EngineConfig, PlayerState,
    Stat, StoryGraph, StoryNode, TimePhase,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn new_engine(seed: &str, store: impl SaveStore + 'static) -> StoryEngine {
    StoryEngine::new(lantern_road().unwrap(), EngineConfig::default())
        .unwrap()
        .with_store(store)
        .with_clock(FixedClock(0))
        .with_seed(seed)
}

fn pick(engine: &mut StoryEngine, text: &str) -> Vec<EventTag> {
    let index = engine
        .view()
        .choices
        .iter()
        .find(|c| c.text == text)
        .map(|c| c.index)
        .unwrap_or_else(|| panic!("'{text}' not offered at {}", engine.state().node));
    engine.choose(index).unwrap()
}

/// Always take the first offered choice, stopping at endings.
fn greedy_run(seed: &str, steps: usize) -> Vec<PlayerState> {
    let mut engine = new_engine(seed, MemoryStore::new());
    let mut states = vec![engine.state().clone()];
    for _ in 0..steps {
        if engine.is_ended() {
            break;
        }
        match engine.view().choices.first() {
            Some(choice) => {
                engine.choose(choice.index).unwrap();
            }
            None => {
                engine.advance_time(1);
            }
        }
        states.push(engine.state().clone());
    }
    states
}

#[test]
fn replay_with_same_seed_is_identical() {
    init_tracing();
    for seed in ["abc", "lantern", "xyz-42"] {
        assert_eq!(greedy_run(seed, 40), greedy_run(seed, 40));
    }
}

#[test]
fn kneeling_branch_uses_post_effect_state() {
    let graph = StoryGraph::from_nodes([
        StoryNode::new("start", "Start").with_choice(
            Choice::new("Kneel")
                .with_set(Effect {
                    karma: 2,
                    ..Default::default()
                })
                .to(Destination::branch(
                    Condition::at_least(Stat::Karma, 2),
                    Destination::node("good_end"),
                    Destination::node("power_end"),
                )),
        ),
        StoryNode::new("good_end", "Good").with_ending(EndingKind::Victory),
        StoryNode::new("power_end", "Power").with_ending(EndingKind::Neutral),
    ])
    .unwrap();

    let mut engine = StoryEngine::new(graph, EngineConfig::default())
        .unwrap()
        .with_seed("abc");
    let events = engine.choose(0).unwrap();

    assert_eq!(engine.state().node.as_str(), "good_end");
    assert!(engine.is_ended());
    assert!(events.contains(&EventTag::Ending(EndingKind::Victory)));
}

#[test]
fn full_route_through_ravine() {
    init_tracing();
    let mut engine = new_engine("abc", MemoryStore::new());

    // Earn coins at the shrine, buy rope at the market.
    pick(&mut engine, "Walk to the village");
    pick(&mut engine, "Visit the shrine");
    pick(&mut engine, "Pocket the offerings");
    assert!(engine.state().coins >= 3);
    assert_eq!(engine.state().karma, -2);

    pick(&mut engine, "Browse the market");
    pick(&mut engine, "Buy a rope (2 coins)");
    assert!(engine.state().has_item("rope"));

    pick(&mut engine, "Return to the crossroads");
    pick(&mut engine, "Take the lantern from the signpost");
    pick(&mut engine, "Descend into the ravine");
    pick(&mut engine, "Leave it be");
    assert_eq!(engine.state().karma, 0);
    assert_eq!(engine.state().node.as_str(), "old_gate");

    let events = pick(&mut engine, "Step through");
    assert_eq!(engine.state().node.as_str(), "wander_end");
    assert!(engine.is_ended());
    assert!(events.contains(&EventTag::Ending(EndingKind::Neutral)));
    assert!(engine.view().choices.is_empty());
}

#[test]
fn tick_and_phase_track_every_action() {
    let mut engine = new_engine("abc", MemoryStore::new());
    let config = engine.config().clone();

    for expected_tick in 1..=20u64 {
        if expected_tick % 3 == 0 {
            engine.advance_time(1);
        } else {
            let index = engine.view().choices[0].index;
            engine.choose(index).unwrap();
        }
        assert_eq!(engine.state().tick, expected_tick);
        assert_eq!(
            engine.state().time,
            time_phase(expected_tick, config.cycle_length)
        );
    }
}

#[test]
fn nine_ticks_is_day() {
    let mut engine = new_engine("abc", MemoryStore::new());
    engine.advance_time(9);
    assert_eq!(engine.state().tick, 9);
    assert_eq!(engine.state().time, TimePhase::Day);
}

#[test]
fn undo_inverts_apply_for_every_choice() {
    let graph = lantern_road().unwrap();
    let config = EngineConfig::default();
    let state = PlayerState::new(&config, "abc");
    let ctx = TransitionContext {
        graph: &graph,
        config: &config,
        now: 0,
    };

    for node in graph.nodes() {
        let mut at_node = state.clone();
        at_node.node = node.id.clone();
        at_node.coins = 10;
        for choice in &node.choices {
            let applied = apply_choice(&ctx, &at_node, choice).state;
            let restored = undo(&applied);
            assert_eq!(restored.snapshot(), at_node.snapshot(), "{}", choice.text);
            assert_eq!(restored.history.len(), at_node.history.len());
        }
    }
}

#[test]
fn save_and_resume_through_file_store() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wayfarer.json");

    let mut engine = new_engine("abc", FileStore::new(&path));
    pick(&mut engine, "Walk to the village");
    pick(&mut engine, "Browse the market");
    let expected = engine.state().clone();

    let mut resumed = StoryEngine::new(lantern_road().unwrap(), EngineConfig::default())
        .unwrap()
        .with_store(FileStore::new(&path));
    assert!(resumed.resume());

    let state = resumed.state();
    assert_eq!(state.snapshot(), expected.snapshot());
    assert_eq!(state.history.len(), 2);
    assert!(state.history.iter().all(|e| e.snapshot.is_none()));
    assert_eq!(state.history[0].choice_text, "Walk to the village");
}

#[test]
fn hard_restart_clears_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wayfarer.json");

    let mut engine = new_engine("abc", FileStore::new(&path));
    pick(&mut engine, "Walk to the village");
    engine.restart(true);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"tick\":0"));
    assert!(!text.contains("\"seed\":\"abc\""));
}

#[test]
fn inn_only_at_night_with_coins() {
    let mut engine = new_engine("abc", MemoryStore::new());
    pick(&mut engine, "Walk to the village");
    pick(&mut engine, "Visit the shrine");
    pick(&mut engine, "Pocket the offerings");
    assert!(engine
        .view()
        .choices
        .iter()
        .all(|c| c.text != "Sleep at the inn (2 coins)"));

    // Tick 3 -> 4 crosses into night.
    engine.advance_time(1);
    assert_eq!(engine.state().time, TimePhase::Night);
    pick(&mut engine, "Sleep at the inn (2 coins)");
    assert_eq!(engine.state().hp, 8);
    assert!(engine
        .view()
        .choices
        .iter()
        .all(|c| c.text != "Sleep at the inn (2 coins)"));
}
