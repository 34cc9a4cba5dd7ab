//! Property-based tests for the state machine
//!
//! Runs random event sequences through `transition` and checks the log and
//! in-flight invariants against a simple model.

use super::*;
use crate::classifier::{Advice, CannedResponseId};
use crate::composer::Submission;
use crate::conversation::{Role, Turn};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Draft(bool),
    Submit(String),
    Respond(bool),
    Fail(bool),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        any::<bool>().prop_map(Step::Draft),
        "[a-z ]{1,20}".prop_map(Step::Submit),
        any::<bool>().prop_map(Step::Respond),
        any::<bool>().prop_map(Step::Fail),
    ]
}

fn to_event(step: &Step) -> Event {
    match step {
        Step::Draft(has_content) => Event::DraftChanged {
            has_content: *has_content,
        },
        Step::Submit(content) => {
            let submission = Submission {
                content: content.clone(),
                attachments: vec![],
            };
            let user_turn = Turn::user(&submission);
            Event::Submitted {
                submission,
                user_turn,
            }
        }
        Step::Respond(draft_has_content) => Event::ResponseReady {
            assistant_turn: Turn::assistant(&Advice::canned(CannedResponseId::GenericMonitor)),
            draft_has_content: *draft_has_content,
        },
        Step::Fail(draft_has_content) => Event::ResponseFailed {
            message: "failed".to_string(),
            draft_has_content: *draft_has_content,
        },
    }
}

proptest! {
    #[test]
    fn prop_never_more_assistant_turns_than_submissions(
        steps in proptest::collection::vec(arb_step(), 0..40)
    ) {
        let mut state = TurnState::Idle;
        let mut log: Vec<Turn> = Vec::new();
        let mut accepted = 0usize;

        for step in &steps {
            let Ok(result) = transition(&state, to_event(step)) else {
                continue;
            };
            if matches!(step, Step::Submit(_)) {
                accepted += 1;
            }
            for effect in result.effects {
                if let Effect::AppendTurn { turn } = effect {
                    log.push(turn);
                }
            }
            state = result.new_state;
        }

        let users = log.iter().filter(|t| t.role() == Role::User).count();
        let assistants = log.iter().filter(|t| t.role() == Role::Assistant).count();
        prop_assert_eq!(users, accepted);
        prop_assert!(assistants <= users);
        // Only the most recent submission can still be waiting
        prop_assert!(users - assistants <= 1);
    }

    #[test]
    fn prop_submit_rejected_iff_in_flight(
        steps in proptest::collection::vec(arb_step(), 0..40)
    ) {
        let mut state = TurnState::Idle;
        for step in &steps {
            let was_in_flight = state.is_in_flight();
            let result = transition(&state, to_event(step));
            if let Step::Submit(_) = step {
                prop_assert_eq!(result.is_err(), was_in_flight);
            }
            if let Ok(result) = result {
                state = result.new_state;
            }
        }
    }

    #[test]
    fn prop_draft_edits_keep_in_flight_flag(
        steps in proptest::collection::vec(arb_step(), 0..40),
        has_content in any::<bool>(),
    ) {
        let mut state = TurnState::Idle;
        for step in &steps {
            if let Ok(result) = transition(&state, to_event(step)) {
                state = result.new_state;
            }
        }
        let after = transition(&state, Event::DraftChanged { has_content }).unwrap();
        prop_assert_eq!(after.new_state.is_in_flight(), state.is_in_flight());
        prop_assert!(after.effects.is_empty());
    }
}
