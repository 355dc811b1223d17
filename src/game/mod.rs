//! Game module - flow control, overlays and tick timing

mod events;
mod input;
mod state;
mod time;

pub use events::{GameEvent, Modal, ModalAction, ModalButton, ModalChoice, Quiz};
pub use input::InputRouter;
pub use state::{FlowError, Game, GameMessage, GameState, Hud, MessageCategory};
pub use time::{FixedTimestep, MAX_STEPS_PER_FRAME};
