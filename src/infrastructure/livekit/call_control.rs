//! `CallControl` backed by the LiveKit room and SIP services

use super::{api_host, map_service_error};
use crate::config::LiveKitConfig;
use crate::domain::call_control::{
    CallControl, CallControlError, OutboundDial, Participant, SipParticipant,
};
use async_trait::async_trait;
use livekit_api::services::room::RoomClient;
use livekit_api::services::sip::{
    CreateSIPParticipantOptions, SIPClient, TransferSIPParticipantOptions,
};
use livekit_protocol::ParticipantInfo;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

const PARTICIPANT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long an outbound leg may ring before the dial gives up
pub const DEFAULT_ANSWER_TIMEOUT: Duration = Duration::from_secs(60);

/// Participant attribute LiveKit keeps the SIP call state in
const SIP_CALL_STATUS: &str = "sip.callStatus";

/// Read access to who is in a room
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    async fn list_participants(&self, room_name: &str)
        -> Result<Vec<Participant>, CallControlError>;
}

#[async_trait]
impl ParticipantDirectory for RoomClient {
    async fn list_participants(
        &self,
        room_name: &str,
    ) -> Result<Vec<Participant>, CallControlError> {
        let participants = RoomClient::list_participants(self, room_name)
            .await
            .map_err(map_service_error)?;
        Ok(participants.into_iter().map(to_participant).collect())
    }
}

fn to_participant(info: ParticipantInfo) -> Participant {
    Participant {
        sid: info.sid,
        identity: info.identity,
        name: info.name,
        attributes: info.attributes,
    }
}

/// A SIP leg counts as answered once its call status is `active`.
/// Participants without a call status are not SIP legs and count as answered.
pub fn is_answered(participant: &Participant) -> bool {
    participant
        .attributes
        .get(SIP_CALL_STATUS)
        .map_or(true, |status| status == "active")
}

/// Poll the room until `identity` is present and `ready`, or the timeout elapses
pub async fn poll_for_participant<D, F>(
    directory: &D,
    room_name: &str,
    identity: &str,
    timeout: Duration,
    ready: F,
) -> Result<Participant, CallControlError>
where
    D: ParticipantDirectory + ?Sized,
    F: Fn(&Participant) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let participants = directory.list_participants(room_name).await?;
        if let Some(participant) = participants
            .into_iter()
            .find(|p| p.identity == identity && ready(p))
        {
            return Ok(participant);
        }

        if Instant::now() + PARTICIPANT_POLL_INTERVAL > deadline {
            return Err(CallControlError::Timeout(format!(
                "participant {} did not join room {} within {:?}",
                identity, room_name, timeout
            )));
        }
        debug!(room = %room_name, %identity, "participant not in room yet");
        tokio::time::sleep(PARTICIPANT_POLL_INTERVAL).await;
    }
}

pub struct LiveKitCallControl {
    rooms: RoomClient,
    sip: SIPClient,
    answer_timeout: Duration,
}

impl LiveKitCallControl {
    pub fn new(config: &LiveKitConfig) -> Self {
        let host = api_host(&config.url);
        Self {
            rooms: RoomClient::with_api_key(&host, &config.api_key, &config.api_secret),
            sip: SIPClient::with_api_key(&host, &config.api_key, &config.api_secret),
            answer_timeout: DEFAULT_ANSWER_TIMEOUT,
        }
    }

    pub fn with_answer_timeout(mut self, answer_timeout: Duration) -> Self {
        self.answer_timeout = answer_timeout;
        self
    }
}

#[async_trait]
impl CallControl for LiveKitCallControl {
    async fn create_sip_participant(
        &self,
        dial: &OutboundDial,
    ) -> Result<SipParticipant, CallControlError> {
        if dial.sip_trunk_id.is_empty() {
            return Err(CallControlError::Config(
                "outbound SIP trunk id is not configured".to_string(),
            ));
        }
        info!(
            room = %dial.room_name,
            trunk = %dial.sip_trunk_id,
            "dialing {}",
            dial.sip_call_to
        );

        let options = CreateSIPParticipantOptions {
            participant_identity: dial.participant_identity.clone(),
            sip_number: Some(dial.sip_number.clone()).filter(|n| !n.is_empty()),
            ..Default::default()
        };
        let info = self
            .sip
            .create_sip_participant(
                dial.sip_trunk_id.clone(),
                dial.sip_call_to.clone(),
                dial.room_name.clone(),
                options,
                None,
            )
            .await
            .map_err(map_service_error)?;

        if dial.wait_until_answered {
            poll_for_participant(
                &self.rooms,
                &dial.room_name,
                &dial.participant_identity,
                self.answer_timeout,
                is_answered,
            )
            .await?;
        }

        Ok(SipParticipant {
            participant_id: info.participant_id,
            participant_identity: info.participant_identity,
            room_name: info.room_name,
            sip_call_id: info.sip_call_id,
        })
    }

    async fn transfer_sip_participant(
        &self,
        room_name: &str,
        participant_identity: &str,
        transfer_to: &str,
    ) -> Result<(), CallControlError> {
        self.sip
            .transfer_sip_participant(
                room_name.to_string(),
                participant_identity.to_string(),
                transfer_to.to_string(),
                TransferSIPParticipantOptions::default(),
            )
            .await
            .map_err(map_service_error)
    }

    async fn delete_room(&self, room_name: &str) -> Result<(), CallControlError> {
        self.rooms
            .delete_room(room_name)
            .await
            .map_err(map_service_error)
    }

    async fn wait_for_participant(
        &self,
        room_name: &str,
        identity: &str,
        timeout: Duration,
    ) -> Result<Participant, CallControlError> {
        poll_for_participant(&self.rooms, room_name, identity, timeout, |_| true).await
    }
}
