//! Effects produced by state transitions

use crate::composer::Submission;
use crate::conversation::Turn;
use crate::runtime::SessionEvent;

use super::TurnState;

/// Effects to be executed after a transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Append a turn to the conversation log
    AppendTurn { turn: Turn },

    /// Start the asynchronous response pipeline
    RequestResponse { submission: Submission },

    /// Tell subscribed renderers something happened
    Notify(SessionEvent),
}

impl Effect {
    pub fn append(turn: Turn) -> Self {
        Effect::AppendTurn { turn }
    }

    pub fn notify_state(state: TurnState) -> Self {
        Effect::Notify(SessionEvent::StateChanged { state })
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Effect::Notify(SessionEvent::Notice {
            message: message.into(),
        })
    }
}
