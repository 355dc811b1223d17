//! Bible Heroes - five Bible-story mini-games in the terminal
//!
//! Run with Noah, face Goliath with David, put Jonah's and Moses' stories
//! back in order, and gather hearts on the road with Jesus.

pub mod data;
pub mod game;
pub mod modes;
pub mod progression;
pub mod save;
pub mod ui;

// Re-export commonly used types
pub use game::{Game, GameEvent, GameState};
pub use modes::{Mode, ModeEvent, Stage};
pub use progression::World;
