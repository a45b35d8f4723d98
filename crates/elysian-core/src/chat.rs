//! Chat client contract.
//!
//! The LLM backend is an external collaborator consumed through two
//! operations: create a session with a system instruction (and optional
//! history), and send a message to get text back. Implementations live in
//! the interaction layer; this module owns the traits and the error
//! surface the rest of the gateway programs against.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Role of a replayed history turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Model,
}

/// A prior conversation turn, replayed when restoring an archived session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: HistoryRole,
    pub text: String,
}

impl HistoryTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Model,
            text: text.into(),
        }
    }
}

/// Inline image data attached to a workbench message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// An outgoing message, optionally enriched with workbench context.
///
/// Code and URL context are folded into the prompt text by the backend;
/// image context is transmitted as inline data.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub text: String,
    pub code_context: Option<String>,
    pub url_context: Option<String>,
    pub image: Option<InlineImage>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code_context = Some(code.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url_context = Some(url.into());
        self
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Failure surfaced by the chat backend.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// The API answered with an error. `message` preserves the raw body,
    /// which may be a JSON blob with nested `error.message/status/code`.
    #[error("{message}")]
    Api {
        status_code: Option<u16>,
        message: String,
        retryable: bool,
        retry_after: Option<Duration>,
    },
    /// The request never reached the API.
    #[error("chat transport error: {0}")]
    Transport(String),
    /// Anything else (missing candidates, parse failures, configuration).
    #[error("{0}")]
    Other(String),
}

impl ChatError {
    pub fn api(status_code: Option<u16>, message: impl Into<String>, retryable: bool) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
            retryable,
            retry_after: None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// The raw backend message.
    pub fn message(&self) -> &str {
        match self {
            Self::Api { message, .. } => message,
            Self::Transport(message) | Self::Other(message) => message,
        }
    }
}

/// An active conversation with the backend.
///
/// Sessions accumulate their own turn history; callers only push new
/// messages and read text back.
#[async_trait::async_trait]
pub trait ChatSession: Send + Sync {
    /// Sends a message and returns the model's text reply.
    async fn send_message(&self, message: OutgoingMessage) -> Result<String, ChatError>;
}

/// Factory for chat sessions.
pub trait ChatClient: Send + Sync {
    /// Creates a session primed with a system instruction and optional
    /// prior history.
    fn create_session(
        &self,
        system_instruction: &str,
        history: Vec<HistoryTurn>,
    ) -> Result<Arc<dyn ChatSession>, ChatError>;
}

/// Returns true when the error carries a rate-limit signature.
///
/// Detection is by status code or substring match on the raw message,
/// mirroring what the backend actually emits for quota exhaustion.
pub fn is_rate_limited(error: &ChatError) -> bool {
    if let ChatError::Api {
        status_code: Some(429),
        ..
    } = error
    {
        return true;
    }
    let message = error.message();
    message.contains("429") || message.contains("RESOURCE_EXHAUSTED")
}

#[derive(Deserialize)]
struct ApiErrorWrapper {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<i64>,
    message: Option<String>,
    status: Option<String>,
}

/// Formats a backend error into a display string.
///
/// When the raw message is a JSON blob of the shape
/// `{"error": {"message", "status", "code"}}`, renders
/// `Server Error: <message> (Status: <status>) (Code: <code>)`; otherwise
/// falls back to the raw message.
pub fn format_api_error(error: &ChatError) -> String {
    let raw = error.message();
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<ApiErrorWrapper>(trimmed) {
            if let Some(message) = parsed.error.message {
                let mut formatted = format!("Server Error: {}", message);
                if let Some(status) = parsed.error.status {
                    formatted.push_str(&format!(" (Status: {})", status));
                }
                if let Some(code) = parsed.error.code {
                    formatted.push_str(&format!(" (Code: {})", code));
                }
                return formatted;
            }
        }
    }
    raw.to_string()
}
