//! # Story Rules
//!
//! The rules crate - owns player state, the story graph, and every pure
//! rule the engine applies: seeded randomness, the day/night clock and its
//! weather, and choice requirements. This crate performs no persistence and
//! holds no presentation logic.

pub mod clock;
pub mod config;
pub mod error;
pub mod requirements;
pub mod rng;
pub mod state;
pub mod story;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use requirements::*;
pub use rng::*;
pub use state::*;
pub use story::*;
