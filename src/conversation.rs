//! Conversation turns and the append-only log

use crate::capture::ImageRef;
use crate::classifier::{Advice, CannedResponseId};
use crate::composer::Submission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opening message of every session
pub const GREETING: &str = "Hello! I'm your farming assistant. How can I help you today? You can ask me about crop diseases, soil conditions, weather impacts, or any other farming questions. Feel free to share images or voice recordings to help me understand your situation better.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    id: TurnId,
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response_id: Option<CannedResponseId>,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(submission: &Submission) -> Self {
        Self {
            id: TurnId::new(),
            role: Role::User,
            content: submission.content.clone(),
            attachments: submission.attachments.clone(),
            response_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(advice: &Advice) -> Self {
        Self {
            id: TurnId::new(),
            role: Role::Assistant,
            content: advice.text.clone(),
            attachments: Vec::new(),
            response_id: Some(advice.response_id),
            created_at: Utc::now(),
        }
    }

    pub fn greeting() -> Self {
        Self {
            id: TurnId::new(),
            role: Role::Assistant,
            content: GREETING.to_string(),
            attachments: Vec::new(),
            response_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attachments(&self) -> &[ImageRef] {
        &self.attachments
    }

    /// Canned response that produced an assistant turn
    pub fn response_id(&self) -> Option<CannedResponseId> {
        self.response_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Ordered log of turns. Entries are only ever appended.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log opened with the assistant greeting
    pub fn with_greeting() -> Self {
        Self {
            turns: vec![Turn::greeting()],
        }
    }

    pub fn append(&mut self, turn: Turn) {
        tracing::debug!(turn_id = %turn.id, role = ?turn.role, position = self.turns.len(), "Turn appended");
        self.turns.push(turn);
    }

    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
