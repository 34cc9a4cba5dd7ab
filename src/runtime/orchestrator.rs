//! Turn orchestrator
//!
//! Single owner of a session's pending input, conversation log and
//! in-flight state. Renderers read snapshots or subscribe to
//! [`SessionEvent`]s; every mutation goes through the methods here.

use super::traits::Responder;
use super::SessionEvent;

use crate::capture::{
    CaptureAdapter, CaptureError, CaptureHandle, ImageDecoder, ImageFile, ImageRef, Microphone,
    ReadError, VoiceClip, MICROPHONE_NOTICE,
};
use crate::composer::{
    AttachmentId, EmptySubmissionError, InputComposer, InputTab, PendingInput, RecordingError,
    RecordingState, Submission, VOICE_TRANSCRIPT_PLACEHOLDER,
};
use crate::config::AdvisorConfig;
use crate::conversation::{ConversationStore, Turn, TurnId};
use crate::state_machine::{transition, Effect, Event, TransitionError, TurnState};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const RECORDING_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A response is still being prepared, wait for it before sending again")]
    InFlight,
    #[error(transparent)]
    Empty(#[from] EmptySubmissionError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Recording(#[from] RecordingError),
}

/// Outcome of a multi-file upload
#[derive(Debug, Default)]
pub struct ImageBatch {
    /// Ids in the order the reads completed
    pub added: Vec<AttachmentId>,
    pub failed: Vec<ReadError>,
}

/// The accepted submission's pending assistant reply
#[derive(Debug)]
pub struct PendingReply {
    user_turn: TurnId,
    task: Option<JoinHandle<Option<Turn>>>,
}

impl PendingReply {
    pub fn user_turn(&self) -> TurnId {
        self.user_turn
    }

    /// Wait for the response pipeline. `None` if it failed.
    pub async fn settled(self) -> Option<Turn> {
        self.task?.await.ok().flatten()
    }
}

struct ActiveRecording {
    handle: CaptureHandle,
    ticker: CancellationToken,
}

struct Core {
    composer: InputComposer,
    state: TurnState,
    log: ConversationStore,
    recording: Option<ActiveRecording>,
}

struct Inner<M, D, R> {
    core: Mutex<Core>,
    capture: CaptureAdapter<M, D>,
    responder: R,
    events: broadcast::Sender<SessionEvent>,
    shutdown: CancellationToken,
}

pub struct TurnOrchestrator<M, D, R>
where
    M: Microphone + 'static,
    D: ImageDecoder + 'static,
    R: Responder + 'static,
{
    inner: Arc<Inner<M, D, R>>,
}

impl<M, D, R> Clone for TurnOrchestrator<M, D, R>
where
    M: Microphone + 'static,
    D: ImageDecoder + 'static,
    R: Responder + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, D, R> TurnOrchestrator<M, D, R>
where
    M: Microphone + 'static,
    D: ImageDecoder + 'static,
    R: Responder + 'static,
{
    pub fn new(config: &AdvisorConfig, capture: CaptureAdapter<M, D>, responder: R) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        let log = if config.greeting {
            ConversationStore::with_greeting()
        } else {
            ConversationStore::new()
        };

        Self {
            inner: Arc::new(Inner {
                core: Mutex::new(Core {
                    composer: InputComposer::new(),
                    state: TurnState::Idle,
                    log,
                    recording: None,
                }),
                capture,
                responder,
                events,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub async fn conversation(&self) -> Vec<Turn> {
        self.inner.core.lock().await.log.all().to_vec()
    }

    pub async fn pending(&self) -> PendingInput {
        self.inner.core.lock().await.composer.pending().clone()
    }

    pub async fn state(&self) -> TurnState {
        self.inner.core.lock().await.state
    }

    pub async fn in_flight(&self) -> bool {
        self.inner.core.lock().await.state.is_in_flight()
    }

    /// Whether the send button is enabled. Disabled while a response is
    /// pending, and on the text tab while every input source is empty.
    pub async fn can_submit(&self) -> bool {
        let core = self.inner.core.lock().await;
        if core.state.is_in_flight() {
            return false;
        }
        let pending = core.composer.pending();
        pending.active_tab != InputTab::Text || pending.has_content()
    }

    // ------------------------------------------------------------------
    // Pending input
    // ------------------------------------------------------------------

    pub async fn set_text(&self, text: impl Into<String>) {
        let mut core = self.inner.core.lock().await;
        core.composer.set_text(text);
        self.inner.draft_changed(&mut core);
    }

    pub async fn select_tab(&self, tab: InputTab) {
        let mut core = self.inner.core.lock().await;
        core.composer.select_tab(tab);
        self.inner.draft_changed(&mut core);
    }

    /// Decode one file and queue it. A failed read is reported and skipped.
    pub async fn add_image_file(&self, file: &ImageFile) -> Result<AttachmentId, ReadError> {
        let image = match self.inner.capture.read_image_file(file).await {
            Ok(image) => image,
            Err(e) => {
                self.inner.publish(SessionEvent::Notice {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let mut core = self.inner.core.lock().await;
        let id = core.composer.add_image(image);
        self.inner.draft_changed(&mut core);
        Ok(id)
    }

    /// Decode several files concurrently. Each image is queued as soon as
    /// its own read finishes, so queue order follows completion order.
    pub async fn add_image_files(&self, files: &[ImageFile]) -> ImageBatch {
        let mut reads: FuturesUnordered<_> =
            files.iter().map(|file| self.add_image_file(file)).collect();

        let mut batch = ImageBatch::default();
        while let Some(result) = reads.next().await {
            match result {
                Ok(id) => batch.added.push(id),
                Err(e) => batch.failed.push(e),
            }
        }

        tracing::info!(
            requested = files.len(),
            added = batch.added.len(),
            failed = batch.failed.len(),
            "Image upload finished"
        );
        batch
    }

    pub async fn remove_image(&self, id: AttachmentId) -> Option<ImageRef> {
        let mut core = self.inner.core.lock().await;
        let removed = core.composer.remove_image(id);
        if removed.is_some() {
            self.inner.draft_changed(&mut core);
        }
        removed
    }

    /// Remove by position; out-of-range indexes do nothing
    pub async fn remove_image_at(&self, index: usize) -> Option<ImageRef> {
        let mut core = self.inner.core.lock().await;
        let removed = core.composer.remove_image_at(index);
        if removed.is_some() {
            self.inner.draft_changed(&mut core);
        }
        removed
    }

    // ------------------------------------------------------------------
    // Voice
    // ------------------------------------------------------------------

    /// Open the microphone and start the recording clock.
    ///
    /// A capture failure publishes a notice and leaves every piece of
    /// session state as it was.
    pub async fn start_recording(&self) -> Result<(), VoiceError> {
        if self.inner.core.lock().await.composer.pending().recording_state
            == RecordingState::Recording
        {
            return Err(RecordingError::AlreadyRecording.into());
        }

        let handle = match self.inner.capture.begin_voice_capture().await {
            Ok(handle) => handle,
            Err(e) => {
                self.inner.publish(SessionEvent::Notice {
                    message: MICROPHONE_NOTICE.to_string(),
                });
                return Err(e.into());
            }
        };

        let mut core = self.inner.core.lock().await;
        // Another start may have won the race while the device was opening;
        // `handle` is dropped (and released) on this error path.
        core.composer.start_recording()?;

        let ticker = self.inner.shutdown.child_token();
        core.recording = Some(ActiveRecording {
            handle,
            ticker: ticker.clone(),
        });
        self.inner.draft_changed(&mut core);
        drop(core);

        tokio::spawn(Arc::clone(&self.inner).run_ticker(ticker));
        Ok(())
    }

    /// Stop the recording, release the microphone and store the transcript
    pub async fn stop_recording(&self) -> Result<VoiceClip, VoiceError> {
        let mut core = self.inner.core.lock().await;
        let Some(active) = core.recording.take() else {
            return Err(RecordingError::NotRecording.into());
        };

        active.ticker.cancel();
        let clip = self.inner.capture.end_voice_capture(active.handle);
        core.composer.stop_recording(VOICE_TRANSCRIPT_PLACEHOLDER)?;
        self.inner.draft_changed(&mut core);

        tracing::info!(
            duration_ms = u64::try_from(clip.duration.as_millis()).unwrap_or(u64::MAX),
            bytes = clip.audio.len(),
            "Voice note recorded"
        );
        Ok(clip)
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Send the pending input.
    ///
    /// Rejected without any change while a response is in flight, and when
    /// there is nothing to send. Otherwise the user turn is appended right
    /// away and the assistant turn follows once the responder finishes.
    pub async fn submit(&self) -> Result<PendingReply, SubmitError> {
        let mut core = self.inner.core.lock().await;

        if core.state.is_in_flight() {
            tracing::debug!("Submit rejected: response in flight");
            return Err(SubmitError::InFlight);
        }

        let submission = match core.composer.compose() {
            Ok(submission) => submission,
            Err(e) => {
                tracing::debug!("Submit rejected: nothing to send");
                return Err(e.into());
            }
        };

        let user_turn = Turn::user(&submission);
        let user_turn_id = user_turn.id();
        tracing::info!(
            turn_id = %user_turn_id,
            chars = submission.content.chars().count(),
            attachments = submission.attachments.len(),
            "Submission accepted"
        );

        let task = self.inner.apply(
            &mut core,
            Event::Submitted {
                submission,
                user_turn,
            },
        )?;
        self.inner.draft_changed(&mut core);

        Ok(PendingReply {
            user_turn: user_turn_id,
            task,
        })
    }

    /// Stop background work and release the microphone if it is open
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let mut core = self.inner.core.lock().await;
        if let Some(active) = core.recording.take() {
            drop(active.handle);
            if core.composer.cancel_recording().is_ok() {
                self.inner.draft_changed(&mut core);
            }
        }
        tracing::info!("Session shut down");
    }
}

impl<M, D, R> Inner<M, D, R>
where
    M: Microphone + 'static,
    D: ImageDecoder + 'static,
    R: Responder + 'static,
{
    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Re-derive Idle/Composing from the draft and push a fresh snapshot
    fn draft_changed(self: &Arc<Self>, core: &mut Core) {
        let has_content = core.composer.pending().has_content();
        if let Err(e) = self.apply(core, Event::DraftChanged { has_content }) {
            tracing::error!(error = %e, "Draft change rejected");
        }
        self.publish(SessionEvent::PendingChanged {
            pending: core.composer.pending().clone(),
        });
    }

    /// Run one transition and execute its effects
    fn apply(
        self: &Arc<Self>,
        core: &mut Core,
        event: Event,
    ) -> Result<Option<JoinHandle<Option<Turn>>>, TransitionError> {
        let result = transition(&core.state, event)?;

        let old_state = std::mem::replace(&mut core.state, result.new_state);
        if old_state != core.state {
            tracing::debug!(from = old_state.name(), to = core.state.name(), "State transition");
        }

        let mut response = None;
        for effect in result.effects {
            match effect {
                Effect::AppendTurn { turn } => {
                    core.log.append(turn.clone());
                    self.publish(SessionEvent::TurnAppended { turn });
                }
                Effect::Notify(event) => self.publish(event),
                Effect::RequestResponse { submission } => {
                    response = Some(tokio::spawn(Arc::clone(self).respond(submission)));
                }
            }
        }
        Ok(response)
    }

    async fn respond(self: Arc<Self>, submission: Submission) -> Option<Turn> {
        let started = tokio::time::Instant::now();
        let outcome = self.responder.respond(&submission).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut core = self.core.lock().await;
        let draft_has_content = core.composer.pending().has_content();

        let (event, assistant_turn) = match outcome {
            Ok(advice) => {
                tracing::info!(response_id = %advice.response_id, elapsed_ms, "Response ready");
                let turn = Turn::assistant(&advice);
                (
                    Event::ResponseReady {
                        assistant_turn: turn.clone(),
                        draft_has_content,
                    },
                    Some(turn),
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, elapsed_ms, "Response failed");
                (
                    Event::ResponseFailed {
                        message: e.to_string(),
                        draft_has_content,
                    },
                    None,
                )
            }
        };

        match self.apply(&mut core, event) {
            Ok(_) => assistant_turn,
            Err(e) => {
                tracing::error!(error = %e, "Response arrived in unexpected state");
                None
            }
        }
    }

    async fn run_ticker(self: Arc<Self>, token: CancellationToken) {
        let mut interval =
            tokio::time::interval_at(tokio::time::Instant::now() + RECORDING_TICK, RECORDING_TICK);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = interval.tick() => {
                    let mut core = self.core.lock().await;
                    if token.is_cancelled() {
                        break;
                    }
                    let Some(elapsed_seconds) = core.composer.tick() else {
                        break;
                    };
                    drop(core);
                    self.publish(SessionEvent::RecordingTick { elapsed_seconds });
                }
            }
        }
    }
}
