//! Pure state transition function

use super::{Effect, Event, TurnState};
use crate::runtime::SessionEvent;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A response is still being prepared, wait for it before sending again")]
    SubmissionInFlight,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Given the same state and event, always produces the same result; all I/O
/// is described by the returned effects.
pub fn transition(state: &TurnState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Draft edits never touch the log
        (TurnState::Idle | TurnState::Composing, Event::DraftChanged { has_content }) => {
            Ok(TransitionResult::new(TurnState::resting(has_content)))
        }

        // Editing while a response is pending is allowed; the flag stays up
        (TurnState::Submitting { .. }, Event::DraftChanged { .. }) => {
            Ok(TransitionResult::new(*state))
        }

        (TurnState::Idle | TurnState::Composing, Event::Submitted { submission, user_turn }) => {
            let new_state = TurnState::Submitting {
                user_turn: user_turn.id(),
            };
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::append(user_turn))
                .with_effect(Effect::notify_state(new_state))
                .with_effect(Effect::RequestResponse { submission }))
        }

        (TurnState::Submitting { .. }, Event::Submitted { .. }) => {
            Err(TransitionError::SubmissionInFlight)
        }

        (
            TurnState::Submitting { .. },
            Event::ResponseReady {
                assistant_turn,
                draft_has_content,
            },
        ) => {
            let new_state = TurnState::resting(draft_has_content);
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::append(assistant_turn))
                .with_effect(Effect::notify_state(new_state))
                .with_effect(Effect::Notify(SessionEvent::ResponseDone)))
        }

        (
            TurnState::Submitting { .. },
            Event::ResponseFailed {
                message,
                draft_has_content,
            },
        ) => {
            let new_state = TurnState::resting(draft_has_content);
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::notice(message))
                .with_effect(Effect::notify_state(new_state))
                .with_effect(Effect::Notify(SessionEvent::ResponseDone)))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}
