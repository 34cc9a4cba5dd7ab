//! Mock implementations for testing
//!
//! These mocks let the orchestrator run without a filesystem or real delays.

use super::traits::{Responder, ResponderError};
use crate::capture::{ImageDecoder, ImageFile, ImageRef, ReadError, ReadErrorKind};
use crate::classifier::{classify, Advice};
use crate::composer::Submission;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Image Decoder
// ============================================================================

/// Decoder with per-file delays and outcomes. Unknown files are not found.
#[derive(Default)]
pub struct MockImageDecoder {
    files: HashMap<String, (Duration, Result<ImageRef, ReadErrorKind>)>,
    /// Names in the order decoding finished
    pub completed: Mutex<Vec<String>>,
}

impl MockImageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, name: &str, delay: Duration) -> Self {
        let image = ImageRef::new(format!("data:image/png;base64,{name}"));
        self.files.insert(name.to_string(), (delay, Ok(image)));
        self
    }

    pub fn with_failure(mut self, name: &str, kind: ReadErrorKind) -> Self {
        self.files
            .insert(name.to_string(), (Duration::ZERO, Err(kind)));
        self
    }

    pub fn image_for(name: &str) -> ImageRef {
        ImageRef::new(format!("data:image/png;base64,{name}"))
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageDecoder for MockImageDecoder {
    async fn decode(&self, file: &ImageFile) -> Result<ImageRef, ReadError> {
        let Some((delay, outcome)) = self.files.get(&file.name).cloned() else {
            return Err(ReadError::new(&file.name, ReadErrorKind::NotFound, "no such mock file"));
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.completed.lock().unwrap().push(file.name.clone());
        outcome.map_err(|kind| ReadError::new(&file.name, kind, "mock decode failure"))
    }
}

// ============================================================================
// Scripted Responder
// ============================================================================

/// Responder that replays queued outcomes, classifying once the queue is empty
pub struct ScriptedResponder {
    delay: Duration,
    outcomes: Mutex<VecDeque<Result<Advice, ResponderError>>>,
    /// Every submission the orchestrator sent
    pub submissions: Mutex<Vec<Submission>>,
}

impl ScriptedResponder {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            outcomes: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_error(&self, message: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(ResponderError::new(message)));
    }

    pub fn recorded_submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for ScriptedResponder {
    async fn respond(&self, submission: &Submission) -> Result<Advice, ResponderError> {
        self.submissions.lock().unwrap().push(submission.clone());
        tokio::time::sleep(self.delay).await;
        let queued = self.outcomes.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok(Advice::canned(classify(submission))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CannedResponseId;

    #[tokio::test]
    async fn test_mock_decoder_outcomes() {
        let decoder = MockImageDecoder::new()
            .with_image("leaf.png", Duration::ZERO)
            .with_failure("broken.png", ReadErrorKind::Corrupt);

        let ok = decoder.decode(&ImageFile::from_path("leaf.png")).await.unwrap();
        assert_eq!(ok, MockImageDecoder::image_for("leaf.png"));

        let err = decoder.decode(&ImageFile::from_path("broken.png")).await.unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::Corrupt);

        let missing = decoder.decode(&ImageFile::from_path("other.png")).await.unwrap_err();
        assert_eq!(missing.kind, ReadErrorKind::NotFound);
        assert_eq!(decoder.completion_order(), vec!["leaf.png", "broken.png"]);
    }

    #[tokio::test]
    async fn test_scripted_responder_replays_then_classifies() {
        let responder = ScriptedResponder::new(Duration::ZERO);
        responder.queue_error("service unavailable");
        let submission = Submission {
            content: "aphids again".to_string(),
            attachments: vec![],
        };

        assert!(responder.respond(&submission).await.is_err());
        let advice = responder.respond(&submission).await.unwrap();
        assert_eq!(advice.response_id, CannedResponseId::PestAphid);
        assert_eq!(responder.recorded_submissions().len(), 2);
    }
}
