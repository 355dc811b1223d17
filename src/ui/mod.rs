//! User Interface module
//!
//! Terminal UI using ratatui.

pub mod app;
pub mod tween;

pub use app::App;
pub use tween::{Tween, TweenQueue, UiElement};
