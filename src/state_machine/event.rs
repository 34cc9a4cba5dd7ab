//! Events that drive the orchestrator

use crate::composer::Submission;
use crate::conversation::Turn;

#[derive(Debug, Clone)]
pub enum Event {
    /// Pending input changed
    DraftChanged { has_content: bool },

    /// A composed submission was accepted for sending
    Submitted {
        submission: Submission,
        user_turn: Turn,
    },

    /// The response pipeline produced the assistant turn
    ResponseReady {
        assistant_turn: Turn,
        draft_has_content: bool,
    },

    /// The response pipeline failed; no assistant turn is added
    ResponseFailed {
        message: String,
        draft_has_content: bool,
    },
}
