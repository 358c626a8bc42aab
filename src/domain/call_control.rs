//! Call control port
//!
//! Rooms, SIP legs and transfers are owned by the media server. The worker
//! only asks for them through this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallControlError {
    /// The server rejected the request. SIP failures carry the SIP status.
    #[error("{message} (code: {code}, SIP status: {} {})", .sip_status_code.as_deref().unwrap_or("-"), .sip_status.as_deref().unwrap_or("-"))]
    Api {
        code: String,
        message: String,
        sip_status_code: Option<String>,
        sip_status: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Outbound call placed into a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundDial {
    pub room_name: String,
    pub sip_trunk_id: String,
    pub sip_call_to: String,
    /// Caller ID presented to the callee
    pub sip_number: String,
    pub participant_identity: String,
    /// Block until the callee answers or the call fails
    pub wait_until_answered: bool,
}

/// SIP leg created for an outbound call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SipParticipant {
    pub participant_id: String,
    pub participant_identity: String,
    pub room_name: String,
    pub sip_call_id: String,
}

/// Room participant as reported by the media server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Participant {
    pub sid: String,
    pub identity: String,
    pub name: String,
    /// SIP legs report `sip.callStatus` here
    pub attributes: HashMap<String, String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallControl: Send + Sync {
    /// Start dialing the callee into the room
    async fn create_sip_participant(
        &self,
        dial: &OutboundDial,
    ) -> Result<SipParticipant, CallControlError>;

    /// Blind-transfer a SIP participant to `transfer_to` (a `tel:` or `sip:` URI)
    async fn transfer_sip_participant(
        &self,
        room_name: &str,
        participant_identity: &str,
        transfer_to: &str,
    ) -> Result<(), CallControlError>;

    /// Delete the room, disconnecting everyone in it
    async fn delete_room(&self, room_name: &str) -> Result<(), CallControlError>;

    /// Resolve once `identity` is present in the room
    async fn wait_for_participant(
        &self,
        room_name: &str,
        identity: &str,
        timeout: Duration,
    ) -> Result<Participant, CallControlError>;
}
