//! Turn orchestration state machine
//!
//! Pure transitions in the Elm style: the runtime feeds an [`Event`], gets
//! back the next [`TurnState`] plus a list of [`Effect`]s, and performs the
//! effects itself.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::TurnState;
pub use transition::{transition, TransitionError, TransitionResult};
