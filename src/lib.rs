//! FarmAssist - turn composition and orchestration core
//!
//! Collects multi-modal user input (typed text, uploaded images, a recorded
//! voice note), merges it into a single submission, records the exchange in
//! an append-only conversation log, and drives the asynchronous response
//! pipeline through a pure state machine.

pub mod capture;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod conversation;
pub mod runtime;
pub mod state_machine;

pub use capture::{CaptureAdapter, CaptureError, ImageFile, ImageRef, ReadError};
pub use classifier::{classify, Advice, CannedResponseId};
pub use composer::{InputComposer, InputTab, PendingInput, RecordingState, Submission};
pub use config::AdvisorConfig;
pub use conversation::{ConversationStore, Role, Turn, TurnId};
pub use runtime::{local_orchestrator, LocalOrchestrator, SessionEvent, TurnOrchestrator};
pub use state_machine::TurnState;
