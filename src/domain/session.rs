//! Agent session port
//!
//! Speech-to-text, the language model, text-to-speech, voice activity and
//! turn detection all run in an external speech pipeline. The worker starts
//! a session there, asks it to speak and answers the tool calls it emits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session connection error: {0}")]
    Connection(String),

    #[error("Session protocol error: {0}")]
    Protocol(String),

    #[error("Session rejected request: {0}")]
    Rejected(String),

    #[error("Session request timed out: {0}")]
    Timeout(String),

    #[error("Session closed")]
    Closed,
}

/// Noise cancellation applied to the room's incoming audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseCancellation {
    Disabled,
    /// Background voice cancellation tuned for telephony audio
    BackgroundVoiceTelephony,
}

/// Tool exposed to the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStart {
    pub room_name: String,
    pub instructions: String,
    pub tools: Vec<ToolDefinition>,
    pub noise_cancellation: NoiseCancellation,
}

/// Tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Result handed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolOutput {
    Text(String),
    Json(Value),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ToolCall(ToolCall),
    Closed { reason: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentSession: Send + Sync {
    async fn start(&self, start: SessionStart) -> Result<(), SessionError>;

    /// Speak a reply following `instructions`. Resolves after playout.
    async fn generate_reply(&self, instructions: &str) -> Result<(), SessionError>;

    /// Resolve once the speech currently playing, if any, has finished
    async fn wait_for_playout(&self) -> Result<(), SessionError>;

    /// Next event from the pipeline, `None` once the stream has ended
    async fn next_event(&self) -> Option<SessionEvent>;

    async fn submit_tool_output(
        &self,
        call_id: &str,
        output: ToolOutput,
        is_error: bool,
    ) -> Result<(), SessionError>;

    async fn close(&self) -> Result<(), SessionError>;
}

/// Opens one agent session per call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn AgentSession>, SessionError>;
}
