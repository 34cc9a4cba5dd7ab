//! Host capture capabilities
//!
//! The core never touches a concrete audio device or file API. Voice input
//! goes through [`Microphone`], image uploads through [`ImageDecoder`], and
//! [`CaptureAdapter`] pairs the two behind the narrow operations the
//! orchestrator needs.

mod image_file;
mod microphone;

pub use image_file::{FsImageDecoder, DEFAULT_MAX_IMAGE_BYTES};
pub use microphone::{MicrophoneAccess, SimulatedMicrophone};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// Message shown to the user when the microphone cannot be opened
pub const MICROPHONE_NOTICE: &str =
    "Could not access microphone. Please check your browser permissions.";

/// A renderable image reference (a `data:` URI or a host blob URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Encode raw image bytes as a `data:` URI
    pub fn data_uri(media_type: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{media_type};base64,{}", BASE64.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // data URIs can be megabytes long
        match self.0.split_once(',') {
            Some((header, body)) if self.0.starts_with("data:") => {
                write!(f, "{header},<{} bytes>", body.len())
            }
            _ => f.write_str(&self.0),
        }
    }
}

/// A file the user picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub path: PathBuf,
}

impl ImageFile {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self { name, path }
    }
}

/// Failure to acquire the microphone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no audio input device available")]
    DeviceUnavailable,
}

/// Per-file decode failure
#[derive(Debug, Clone, Error)]
#[error("could not read {file}: {message}")]
pub struct ReadError {
    pub file: String,
    pub kind: ReadErrorKind,
    pub message: String,
}

impl ReadError {
    pub fn new(file: impl Into<String>, kind: ReadErrorKind, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrorKind {
    NotFound,
    Unsupported,
    TooLarge,
    Corrupt,
    Io,
}

/// A live recording session handed out by a [`Microphone`]
pub trait RecordingSession: Send {
    /// Stop recording and return whatever audio was captured
    fn stop(&mut self) -> Vec<u8>;

    /// Release the underlying device. Must tolerate repeated calls.
    fn release(&mut self);
}

/// Host capability: request microphone access
#[async_trait]
pub trait Microphone: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn RecordingSession>, CaptureError>;
}

/// Host capability: decode a user-selected file into a displayable reference
#[async_trait]
pub trait ImageDecoder: Send + Sync {
    async fn decode(&self, file: &ImageFile) -> Result<ImageRef, ReadError>;
}

#[async_trait]
impl<T: Microphone + ?Sized> Microphone for Arc<T> {
    async fn acquire(&self) -> Result<Box<dyn RecordingSession>, CaptureError> {
        (**self).acquire().await
    }
}

#[async_trait]
impl<T: ImageDecoder + ?Sized> ImageDecoder for Arc<T> {
    async fn decode(&self, file: &ImageFile) -> Result<ImageRef, ReadError> {
        (**self).decode(file).await
    }
}

/// Ownership of an open recording.
///
/// The device is released when the handle is finished or, failing that,
/// when it is dropped.
pub struct CaptureHandle {
    id: Uuid,
    started: Instant,
    session: Option<Box<dyn RecordingSession>>,
}

impl CaptureHandle {
    fn new(session: Box<dyn RecordingSession>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Instant::now(),
            session: Some(session),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop the recording and release the device
    pub fn finish(mut self) -> VoiceClip {
        let duration = self.started.elapsed();
        let audio = match self.session.take() {
            Some(mut session) => {
                let audio = session.stop();
                session.release();
                audio
            }
            None => Vec::new(),
        };
        tracing::debug!(capture_id = %self.id, bytes = audio.len(), ?duration, "Voice capture finished");
        VoiceClip { audio, duration }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            tracing::debug!(capture_id = %self.id, "Releasing abandoned voice capture");
            session.release();
        }
    }
}

impl fmt::Debug for CaptureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureHandle")
            .field("id", &self.id)
            .field("elapsed", &self.started.elapsed())
            .field("open", &self.session.is_some())
            .finish()
    }
}

/// Result of a finished voice capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceClip {
    pub audio: Vec<u8>,
    pub duration: Duration,
}

/// The two capture capabilities the core consumes
pub struct CaptureAdapter<M, D> {
    microphone: M,
    decoder: D,
}

impl<M, D> CaptureAdapter<M, D>
where
    M: Microphone,
    D: ImageDecoder,
{
    pub fn new(microphone: M, decoder: D) -> Self {
        Self {
            microphone,
            decoder,
        }
    }

    pub async fn begin_voice_capture(&self) -> Result<CaptureHandle, CaptureError> {
        match self.microphone.acquire().await {
            Ok(session) => {
                let handle = CaptureHandle::new(session);
                tracing::info!(capture_id = %handle.id(), "Voice capture started");
                Ok(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not access microphone");
                Err(e)
            }
        }
    }

    #[allow(clippy::unused_self)]
    pub fn end_voice_capture(&self, handle: CaptureHandle) -> VoiceClip {
        handle.finish()
    }

    pub async fn read_image_file(&self, file: &ImageFile) -> Result<ImageRef, ReadError> {
        let result = self.decoder.decode(file).await;
        if let Err(e) = &result {
            tracing::warn!(file = %file.name, kind = ?e.kind, error = %e.message, "Image read failed");
        }
        result
    }
}
