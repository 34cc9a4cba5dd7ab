//! Orchestrator state

use crate::conversation::TurnId;
use serde::{Deserialize, Serialize};

/// Where the conversation is in the submit/respond cycle.
///
/// `Idle` and `Composing` behave the same; `Composing` only tells the
/// renderer that pending input exists. `Submitting` is the in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    Idle,
    Composing,
    Submitting { user_turn: TurnId },
}

impl TurnState {
    /// Resting state for the given draft
    pub fn resting(draft_has_content: bool) -> Self {
        if draft_has_content {
            TurnState::Composing
        } else {
            TurnState::Idle
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, TurnState::Submitting { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::Composing => "composing",
            TurnState::Submitting { .. } => "submitting",
        }
    }
}
