//! Pending input and turn composition
//!
//! [`InputComposer`] owns the single [`PendingInput`] of a session: the text
//! draft, queued images, the voice transcript and the recording clock. Every
//! mutation goes through its methods; [`InputComposer::compose`] turns the
//! pending state into one [`Submission`].

use crate::capture::ImageRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Content used when only images were shared
pub const IMAGES_ONLY_LABEL: &str = "I've shared some images with you.";

/// Transcript recorded for every voice note until speech-to-text exists
pub const VOICE_TRANSCRIPT_PLACEHOLDER: &str =
    "I've recorded a voice note about crop rotation and soil management techniques.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

/// Input tab the user is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTab {
    #[default]
    Text,
    Images,
    Voice,
}

/// Stable identity of a queued image, independent of its list position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(Uuid);

impl AttachmentId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingImage {
    pub id: AttachmentId,
    pub image: ImageRef,
}

/// Everything the user has entered but not yet sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInput {
    pub text_draft: String,
    pub images: Vec<PendingImage>,
    pub voice_transcript: Option<String>,
    pub recording_state: RecordingState,
    pub recording_elapsed_seconds: u32,
    pub active_tab: InputTab,
}

impl PendingInput {
    /// Whether any of text, voice or images would produce a submission
    pub fn has_content(&self) -> bool {
        !self.text_draft.is_empty()
            || self.voice_transcript.as_deref().is_some_and(|t| !t.is_empty())
            || !self.images.is_empty()
    }
}

/// A composed user message, ready to become a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub content: String,
    pub attachments: Vec<ImageRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("nothing to submit: text, voice and images are all empty")]
pub struct EmptySubmissionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no recording in progress")]
    NotRecording,
}

#[derive(Debug, Default)]
pub struct InputComposer {
    pending: PendingInput,
}

impl InputComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &PendingInput {
        &self.pending
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.pending.text_draft = text.into();
    }

    pub fn select_tab(&mut self, tab: InputTab) {
        self.pending.active_tab = tab;
    }

    /// Queue a decoded image; returns the id used to remove it later
    pub fn add_image(&mut self, image: ImageRef) -> AttachmentId {
        let id = AttachmentId::new();
        self.pending.images.push(PendingImage { id, image });
        id
    }

    pub fn remove_image(&mut self, id: AttachmentId) -> Option<ImageRef> {
        let index = self.pending.images.iter().position(|p| p.id == id)?;
        Some(self.pending.images.remove(index).image)
    }

    /// Remove by list position. Out-of-range indexes are ignored.
    pub fn remove_image_at(&mut self, index: usize) -> Option<ImageRef> {
        if index < self.pending.images.len() {
            Some(self.pending.images.remove(index).image)
        } else {
            None
        }
    }

    /// Idle -> Recording, restarting the clock
    pub fn start_recording(&mut self) -> Result<(), RecordingError> {
        if self.pending.recording_state == RecordingState::Recording {
            return Err(RecordingError::AlreadyRecording);
        }
        self.pending.recording_state = RecordingState::Recording;
        self.pending.recording_elapsed_seconds = 0;
        Ok(())
    }

    /// Advance the recording clock by one second; ignored when idle
    pub fn tick(&mut self) -> Option<u32> {
        if self.pending.recording_state != RecordingState::Recording {
            return None;
        }
        self.pending.recording_elapsed_seconds =
            self.pending.recording_elapsed_seconds.saturating_add(1);
        Some(self.pending.recording_elapsed_seconds)
    }

    /// Recording -> Idle, storing the transcript of the finished clip
    pub fn stop_recording(&mut self, transcript: impl Into<String>) -> Result<(), RecordingError> {
        if self.pending.recording_state != RecordingState::Recording {
            return Err(RecordingError::NotRecording);
        }
        self.pending.recording_state = RecordingState::Idle;
        self.pending.voice_transcript = Some(transcript.into());
        Ok(())
    }

    /// Recording -> Idle without keeping a transcript (device lost or session closed)
    pub fn cancel_recording(&mut self) -> Result<(), RecordingError> {
        if self.pending.recording_state != RecordingState::Recording {
            return Err(RecordingError::NotRecording);
        }
        self.pending.recording_state = RecordingState::Idle;
        Ok(())
    }

    /// Merge the pending channels into one submission.
    ///
    /// Content priority is text, then voice transcript, then the images-only
    /// label. On success the draft, images, transcript and tab are reset
    /// together; a recording still in progress keeps its state and clock since
    /// the microphone is still open. On failure nothing changes.
    pub fn compose(&mut self) -> Result<Submission, EmptySubmissionError> {
        let voice = self
            .pending
            .voice_transcript
            .as_deref()
            .filter(|t| !t.is_empty());

        let content = if !self.pending.text_draft.is_empty() {
            self.pending.text_draft.clone()
        } else if let Some(voice) = voice {
            voice.to_string()
        } else if !self.pending.images.is_empty() {
            IMAGES_ONLY_LABEL.to_string()
        } else {
            return Err(EmptySubmissionError);
        };

        let cleared = PendingInput {
            recording_state: self.pending.recording_state,
            recording_elapsed_seconds: self.pending.recording_elapsed_seconds,
            ..PendingInput::default()
        };
        let taken = std::mem::replace(&mut self.pending, cleared);

        Ok(Submission {
            content,
            attachments: taken.images.into_iter().map(|p| p.image).collect(),
        })
    }
}

/// Render a recording clock as `MM:SS`
pub fn format_elapsed(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
