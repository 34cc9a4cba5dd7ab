//! Runtime that drives a conversation session
//!
//! Owns the pending input, conversation log and in-flight state behind the
//! [`TurnOrchestrator`], executes state machine effects, and fans session
//! events out to renderers.

mod orchestrator;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use orchestrator::{ImageBatch, PendingReply, SubmitError, TurnOrchestrator, VoiceError};
pub use traits::*;

use crate::capture::{CaptureAdapter, FsImageDecoder, MicrophoneAccess, SimulatedMicrophone};
use crate::composer::PendingInput;
use crate::config::AdvisorConfig;
use crate::conversation::Turn;
use crate::state_machine::TurnState;
use serde::{Deserialize, Serialize};

/// Orchestrator wired to local capture adapters and the canned responder
pub type LocalOrchestrator = TurnOrchestrator<SimulatedMicrophone, FsImageDecoder, CannedResponder>;

/// Build a [`LocalOrchestrator`] from configuration
pub fn local_orchestrator(config: &AdvisorConfig, microphone: MicrophoneAccess) -> LocalOrchestrator {
    let capture = CaptureAdapter::new(
        SimulatedMicrophone::new(microphone),
        FsImageDecoder::new(config.max_image_bytes),
    );
    TurnOrchestrator::new(config, capture, CannedResponder::new(config.response_delay))
}

/// Events sent to renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    TurnAppended { turn: Turn },
    /// Snapshot of the pending input after any change
    PendingChanged { pending: PendingInput },
    StateChanged { state: TurnState },
    RecordingTick { elapsed_seconds: u32 },
    /// Transient, user-facing message (capture failures and the like)
    Notice { message: String },
    ResponseDone,
}
