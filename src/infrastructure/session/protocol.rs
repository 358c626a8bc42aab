//! Wire messages exchanged with the speech pipeline
//!
//! JSON text frames tagged by `type`. Requests that expect completion carry
//! an `id` echoed back in an `ack` (or an `error`).

use crate::domain::session::{SessionStart, ToolCall, ToolOutput};
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Start {
        id: String,
        version: &'static str,
        #[serde(flatten)]
        session: SessionStart,
    },
    GenerateReply {
        id: String,
        instructions: String,
    },
    WaitForPlayout {
        id: String,
    },
    ToolOutput {
        call_id: String,
        output: ToolOutput,
        is_error: bool,
    },
    Close,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Ack {
        id: String,
    },
    ToolCall(ToolCall),
    Closed {
        #[serde(default)]
        reason: String,
    },
    Error {
        #[serde(default)]
        id: Option<String>,
        message: String,
    },
}
