//! Undo history.
//!
//! The trail is a bounded stack of [`HistoryEntry`] values. Entries pushed
//! by a transition carry a full snapshot and can be rewound one step at a
//! time; entries restored from a save carry only the display fields.

use std::time::{SystemTime, UNIX_EPOCH};

use story_rules::{HistoryEntry, PlayerState};

/// Source of wall-clock timestamps for history entries.
pub trait WallClock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Always reports the same instant. Makes replays bit-identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub u64);

impl WallClock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// Push an entry and evict the oldest ones beyond `limit`.
pub fn push_bounded(history: &mut Vec<HistoryEntry>, entry: HistoryEntry, limit: usize) {
    history.push(entry);
    if history.len() > limit {
        let excess = history.len() - limit;
        history.drain(..excess);
    }
}

/// True if the most recent entry can be rewound.
pub fn can_undo(state: &PlayerState) -> bool {
    state
        .history
        .last()
        .is_some_and(|entry| entry.snapshot.is_some())
}

/// Rewind one step. With no history, or when the latest entry has no
/// snapshot, the state comes back unchanged.
pub fn undo(state: &PlayerState) -> PlayerState {
    let mut next = state.clone();
    if !can_undo(&next) {
        return next;
    }

    if let Some(snapshot) = next.history.pop().and_then(|entry| entry.snapshot) {
        tracing::debug!(from = %next.node, to = %snapshot.node, tick = snapshot.tick, "undo");
        next.restore(snapshot);
    }
    next
}
