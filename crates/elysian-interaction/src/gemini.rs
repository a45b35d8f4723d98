//! Gemini chat backend - direct REST API implementation.
//!
//! Talks to the Gemini HTTP API without SDK dependency. Each session
//! carries its own turn history and system instruction; workbench
//! context (code, URL, inline images) is folded into the request parts.

use crate::config::InteractionConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use elysian_core::chat::{
    ChatClient, ChatError, ChatSession, HistoryRole, HistoryTurn, OutgoingMessage,
};
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Session factory for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiChatClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiChatClient {
    /// Creates a client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Loads configuration from `config.toml` / the environment.
    ///
    /// Model name defaults to `gemini-2.5-flash` if not specified.
    pub fn from_config() -> Result<Self, ChatError> {
        let config = InteractionConfig::load()
            .map_err(|e| ChatError::other(format!("Failed to load configuration: {e}")))?;

        let api_key = config.gemini_api_key().ok_or_else(|| {
            ChatError::other("Gemini API key not configured. Set GEMINI_API_KEY or config.toml.")
        })?;
        let model = config
            .gemini_model()
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        Ok(Self::new(api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl ChatClient for GeminiChatClient {
    fn create_session(
        &self,
        system_instruction: &str,
        history: Vec<HistoryTurn>,
    ) -> Result<Arc<dyn ChatSession>, ChatError> {
        let system_instruction = if system_instruction.trim().is_empty() {
            None
        } else {
            Some(system_instruction.to_string())
        };

        let contents = history.into_iter().map(Content::from_turn).collect();

        Ok(Arc::new(GeminiChatSession {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            system_instruction,
            history: Mutex::new(contents),
        }))
    }
}

/// One multi-turn conversation against the Gemini API.
pub struct GeminiChatSession {
    client: Client,
    api_key: String,
    model: String,
    system_instruction: Option<String>,
    /// Accumulated turns; the lock also serializes concurrent sends so
    /// turns reach the API in order.
    history: Mutex<Vec<Content>>,
}

impl GeminiChatSession {
    fn build_parts(message: &OutgoingMessage) -> Result<Vec<Part>, ChatError> {
        let mut text = message.text.clone();
        if let Some(code) = &message.code_context {
            text.push_str(&format!(
                "\n\nAnalyze the following code:\n```\n{code}\n```"
            ));
        }
        if let Some(url) = &message.url_context {
            text.push_str(&format!(
                "\n\nAnalyze the content from the following URL: {url}"
            ));
        }

        let mut parts = Vec::new();
        if let Some(image) = &message.image {
            parts.push(Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: image.mime_type.clone(),
                    data: BASE64_STANDARD.encode(&image.data),
                },
            });
        }
        if !text.trim().is_empty() {
            parts.push(Part::Text { text });
        }

        if parts.is_empty() {
            return Err(ChatError::other(
                "Gemini message must include text or supported attachments",
            ));
        }
        Ok(parts)
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, ChatError> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ChatError::Transport(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ChatError::other(format!("Failed to parse Gemini response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait::async_trait]
impl ChatSession for GeminiChatSession {
    async fn send_message(&self, message: OutgoingMessage) -> Result<String, ChatError> {
        let user_content = Content {
            role: "user".to_string(),
            parts: Self::build_parts(&message)?,
        };

        let mut history = self.history.lock().await;
        let mut contents = history.clone();
        contents.push(user_content.clone());

        let request = GenerateContentRequest {
            contents,
            system_instruction: self.system_instruction.as_ref().map(|text| Content {
                role: "system".to_string(),
                parts: vec![Part::Text { text: text.clone() }],
            }),
        };

        let text = self.send_request(&request).await?;

        history.push(user_content);
        history.push(Content {
            role: "model".to_string(),
            parts: vec![Part::Text { text: text.clone() }],
        });
        Ok(text)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Clone, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn from_turn(turn: HistoryTurn) -> Self {
        let role = match turn.role {
            HistoryRole::User => "user",
            HistoryRole::Model => "model",
        };
        Self {
            role: role.to_string(),
            parts: vec![Part::Text { text: turn.text }],
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, ChatError> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            ChatError::other("Gemini API returned no text in the response candidates")
        })
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> ChatError {
    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    // The raw body is preserved; display formatting happens at the edge
    // via `format_api_error`.
    ChatError::Api {
        status_code: Some(status.as_u16()),
        message: body,
        retryable: is_retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // Retry-After HTTP-date parsing is omitted for simplicity
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use elysian_core::chat::InlineImage;

    #[test]
    fn test_build_parts_folds_workbench_context() {
        let message = OutgoingMessage::text("review this")
            .with_code("fn main() {}")
            .with_url("https://example.com");

        let parts = GeminiChatSession::build_parts(&message).unwrap();
        assert_eq!(parts.len(), 1);
        match &parts[0] {
            Part::Text { text } => {
                assert!(text.starts_with("review this"));
                assert!(text.contains("fn main() {}"));
                assert!(text.contains("https://example.com"));
            }
            _ => panic!("expected text part"),
        }
    }

    #[test]
    fn test_build_parts_puts_image_first() {
        let message = OutgoingMessage::text("what is this?").with_image(InlineImage {
            name: "scan.png".to_string(),
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        });

        let parts = GeminiChatSession::build_parts(&message).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[0], Part::InlineData { .. }));
        assert!(matches!(parts[1], Part::Text { .. }));
    }

    #[test]
    fn test_build_parts_rejects_empty_message() {
        let err = GeminiChatSession::build_parts(&OutgoingMessage::text("   ")).unwrap_err();
        assert!(err.message().contains("must include text"));
    }

    #[test]
    fn test_map_http_error_preserves_raw_body() {
        let body = r#"{"error":{"message":"quota","status":"RESOURCE_EXHAUSTED","code":429}}"#;
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, body.to_string(), None);

        assert!(elysian_core::chat::is_rate_limited(&err));
        match err {
            ChatError::Api {
                status_code,
                retryable,
                message,
                ..
            } => {
                assert_eq!(status_code, Some(429));
                assert!(retryable);
                assert_eq!(message, body);
            }
            _ => panic!("expected api error"),
        }
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = map_http_error(StatusCode::BAD_REQUEST, "bad key".to_string(), None);
        match err {
            ChatError::Api { retryable, .. } => assert!(!retryable),
            _ => panic!("expected api error"),
        }
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let header = HeaderValue::from_static("30");
        assert_eq!(
            parse_retry_after(Some(&header)),
            Some(Duration::from_secs(30))
        );
        let header = HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&header)), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_extract_text_takes_last_candidate_text() {
        let response = GenerateContentResponse {
            candidates: Some(vec![Candidate {
                content: Some(ContentResponse {
                    parts: vec![
                        PartResponse { text: None },
                        PartResponse {
                            text: Some("hello".to_string()),
                        },
                    ],
                }),
            }]),
        };
        assert_eq!(extract_text_response(response).unwrap(), "hello");
    }

    #[test]
    fn test_extract_text_with_no_candidates_is_error() {
        let response = GenerateContentResponse { candidates: None };
        assert!(extract_text_response(response).is_err());
    }

    #[test]
    fn test_create_session_replays_history() {
        let client = GeminiChatClient::new("key", DEFAULT_GEMINI_MODEL);
        let session = client
            .create_session(
                "be yourself",
                vec![HistoryTurn::user("hi"), HistoryTurn::model("hello")],
            )
            .unwrap();
        // Session creation is cheap and offline; the replayed history is
        // only sent with the first message.
        drop(session);
    }
}
