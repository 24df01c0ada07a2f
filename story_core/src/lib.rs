//! # Story Core
//!
//! The engine of the branching narrative system. This crate drives play on
//! top of `story_rules`: it applies choices, keeps the undo trail, encodes
//! saves, and hands presentation a rendered view of the current scene.
//!
//! ## Core Components
//!
//! - **transition**: Pure state-transition function for a chosen edge
//! - **history**: Bounded undo stack and wall-clock sources
//! - **save**: Lenient save codec with a trimmed trail
//! - **storage**: Best-effort persistence backends
//! - **engine**: The `StoryEngine` facade presentation talks to
//! - **events**: Event tags for sound and visual cues
//!
//! ## Design Philosophy
//!
//! - **Single Writer**: Only the engine mutates player state, one action at a time
//! - **Total**: Content mistakes and storage failures degrade, they never abort play
//! - **Replayable**: Same seed and same choices produce the same run

pub mod content;
pub mod engine;
pub mod events;
pub mod history;
pub mod save;
pub mod storage;
pub mod text;
pub mod transition;

pub use engine::*;
pub use events::*;
pub use history::{FixedClock, SystemClock, WallClock};
pub use save::{SaveBlob, SaveError};
pub use storage::*;
pub use transition::{Transition, TransitionContext};
