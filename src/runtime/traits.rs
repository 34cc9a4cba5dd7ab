//! Trait abstractions for the response pipeline
//!
//! The orchestrator only knows the [`Responder`] port, so the canned stub can
//! be swapped for a real advisory service without touching orchestration.

use crate::classifier::{classify, Advice};
use crate::composer::Submission;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResponderError {
    pub message: String,
}

impl ResponderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Produces the assistant's answer to a submission
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, submission: &Submission) -> Result<Advice, ResponderError>;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn respond(&self, submission: &Submission) -> Result<Advice, ResponderError> {
        (**self).respond(submission).await
    }
}

/// Waits a fixed "thinking" delay, then answers from the canned set
pub struct CannedResponder {
    delay: Duration,
}

impl CannedResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Responder for CannedResponder {
    async fn respond(&self, submission: &Submission) -> Result<Advice, ResponderError> {
        tokio::time::sleep(self.delay).await;
        let response_id = classify(submission);
        tracing::debug!(%response_id, attachments = submission.attachments.len(), "Canned response selected");
        Ok(Advice::canned(response_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CannedResponseId;

    #[tokio::test(start_paused = true)]
    async fn test_canned_responder_waits_then_classifies() {
        let responder = CannedResponder::new(Duration::from_secs(2));
        let submission = Submission {
            content: "Is it going to rain this week?".to_string(),
            attachments: vec![],
        };

        let started = tokio::time::Instant::now();
        let advice = responder.respond(&submission).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(advice.response_id, CannedResponseId::WeatherIrrigation);
        assert_eq!(advice.text, CannedResponseId::WeatherIrrigation.advice());
    }
}
