//! Simulated microphone for hosts without an audio stack
//!
//! Produces silent 16 kHz mono PCM for the recorded duration. The device is
//! exclusive: a second acquire while a session is open reports
//! `DeviceUnavailable`.

use super::{CaptureError, Microphone, RecordingSession};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// 16 kHz, 16-bit samples
const BYTES_PER_MILLI: u128 = 32;

/// Upper bound on a single clip (10 minutes)
const MAX_CLIP_BYTES: usize = 10 * 60 * 32_000;

/// How the host answers a microphone request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicrophoneAccess {
    Granted,
    Denied,
    NoDevice,
}

pub struct SimulatedMicrophone {
    access: MicrophoneAccess,
    in_use: Arc<AtomicBool>,
}

impl SimulatedMicrophone {
    pub fn new(access: MicrophoneAccess) -> Self {
        Self {
            access,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a recording session currently holds the device
    pub fn in_use(&self) -> bool {
        self.in_use.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Microphone for SimulatedMicrophone {
    async fn acquire(&self) -> Result<Box<dyn RecordingSession>, CaptureError> {
        match self.access {
            MicrophoneAccess::Denied => Err(CaptureError::PermissionDenied),
            MicrophoneAccess::NoDevice => Err(CaptureError::DeviceUnavailable),
            MicrophoneAccess::Granted => {
                if self.in_use.swap(true, Ordering::SeqCst) {
                    return Err(CaptureError::DeviceUnavailable);
                }
                Ok(Box::new(SimulatedSession {
                    started: Instant::now(),
                    in_use: Arc::clone(&self.in_use),
                    released: false,
                }))
            }
        }
    }
}

struct SimulatedSession {
    started: Instant,
    in_use: Arc<AtomicBool>,
    released: bool,
}

impl RecordingSession for SimulatedSession {
    fn stop(&mut self) -> Vec<u8> {
        let bytes = self.started.elapsed().as_millis() * BYTES_PER_MILLI;
        let len = usize::try_from(bytes).unwrap_or(MAX_CLIP_BYTES).min(MAX_CLIP_BYTES);
        vec![0; len]
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.in_use.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.release();
    }
}
