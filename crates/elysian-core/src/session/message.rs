//! Conversation message types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    /// The human operator.
    User,
    /// The reconstructed counterpart (individual or group).
    Avatar,
    /// Gateway-generated notices.
    System,
}

/// Display record of an image attached through the workbench.
///
/// Only metadata is kept in the transcript; the bytes travel to the
/// backend and are not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContext {
    pub name: String,
    pub mime_type: String,
}

/// A single message in a conversation.
///
/// Messages are append-only: once created they are never mutated, and a
/// transcript only ever grows at the tail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    /// Creation time (ISO 8601 format).
    pub timestamp: String,
    pub text: String,
    pub sender: MessageSender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_context: Option<ImageContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_context: Option<String>,
}

impl ChatMessage {
    pub fn new(sender: MessageSender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            text: text.into(),
            sender,
            image_context: None,
            code_context: None,
            url_context: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageSender::User, text)
    }

    pub fn avatar(text: impl Into<String>) -> Self {
        Self::new(MessageSender::Avatar, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageSender::System, text)
    }

    pub fn with_code_context(mut self, code: impl Into<String>) -> Self {
        self.code_context = Some(code.into());
        self
    }

    pub fn with_url_context(mut self, url: impl Into<String>) -> Self {
        self.url_context = Some(url.into());
        self
    }

    pub fn with_image_context(mut self, image: ImageContext) -> Self {
        self.image_context = Some(image);
        self
    }
}
