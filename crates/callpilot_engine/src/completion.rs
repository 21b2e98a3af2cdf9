use std::sync::{PoisonError, RwLock};

use pilot_logging::{pilot_debug, pilot_warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::{FailureKind, LlmSettings, StageError};

/// Returned in place of generated text when the response carries no message
/// content. JSON-consuming stages fail on it naturally.
pub const NO_CONTENT_SENTINEL: &str = "No response received";

const FALLBACK_REMOTE_MESSAGE: &str = "API error occurred";

/// One system instruction plus one user message; both non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    instruction: String,
    content: String,
}

impl CompletionRequest {
    pub fn new(
        instruction: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, StageError> {
        let instruction = instruction.into();
        let content = content.into();
        if instruction.trim().is_empty() {
            return Err(StageError::new(
                FailureKind::InvalidRequest,
                "instruction is empty",
            ));
        }
        if content.trim().is_empty() {
            return Err(StageError::new(
                FailureKind::InvalidRequest,
                "content is empty",
            ));
        }
        Ok(Self {
            instruction,
            content,
        })
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Whether a request could be issued at all.
    fn is_configured(&self) -> bool {
        true
    }

    /// Single attempt; failures are surfaced immediately.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, StageError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug)]
pub struct ReqwestCompletionClient {
    settings: RwLock<LlmSettings>,
}

impl ReqwestCompletionClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    pub fn settings(&self) -> LlmSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_settings(&self, settings: LlmSettings) {
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }

    fn build_client(settings: &LlmSettings) -> Result<reqwest::Client, StageError> {
        reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| StageError::new(FailureKind::Transport, err.to_string()))
    }
}

#[async_trait::async_trait]
impl CompletionClient for ReqwestCompletionClient {
    fn is_configured(&self) -> bool {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_configured()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, StageError> {
        let settings = self.settings();
        if !settings.is_configured() {
            return Err(StageError::new(
                FailureKind::Configuration,
                "completion endpoint and token are not configured",
            ));
        }

        let body = ChatRequest {
            model: &settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.instruction(),
                },
                ChatMessage {
                    role: "user",
                    content: request.content(),
                },
            ],
        };
        let payload = serde_json::to_vec(&body)
            .map_err(|err| StageError::new(FailureKind::InvalidRequest, err.to_string()))?;

        let client = Self::build_client(&settings)?;
        pilot_debug!(
            "POST {} model={} content_len={}",
            settings.endpoint,
            settings.model,
            request.content().len()
        );
        let response = client
            .post(settings.endpoint.as_str())
            .header(AUTHORIZATION, settings.authorization_header())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_reqwest_error)?;
        interpret_response(status, &text)
    }
}

/// Turns an HTTP status and body into generated text or a failure.
///
/// An `error` payload wins over the status code; a success without message
/// content yields [`NO_CONTENT_SENTINEL`].
pub fn interpret_response(status: u16, body: &str) -> Result<String, StageError> {
    let success = (200..300).contains(&status);
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            return Err(match status {
                401 | 403 => {
                    StageError::new(FailureKind::Authentication, format!("HTTP status {status}"))
                }
                _ if !success => {
                    StageError::new(FailureKind::Remote, format!("HTTP status {status}"))
                }
                _ => StageError::new(FailureKind::MalformedResponse, err.to_string()),
            });
        }
    };

    if let Some(error) = value.get("error").filter(|error| !error.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or(FALLBACK_REMOTE_MESSAGE);
        pilot_warn!("Completion endpoint returned an error: {}", message);
        return Err(StageError::new(FailureKind::Remote, message));
    }

    match status {
        401 | 403 => {
            return Err(StageError::new(
                FailureKind::Authentication,
                format!("HTTP status {status}"),
            ))
        }
        _ if !success => {
            return Err(StageError::new(
                FailureKind::Remote,
                format!("HTTP status {status}"),
            ))
        }
        _ => {}
    }

    let content = value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty());
    match content {
        Some(content) => Ok(content.to_string()),
        None => {
            pilot_warn!("Completion response carried no message content");
            Ok(NO_CONTENT_SENTINEL.to_string())
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> StageError {
    if err.is_timeout() {
        return StageError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return StageError::new(FailureKind::Configuration, err.to_string());
    }
    StageError::new(FailureKind::Transport, err.to_string())
}
