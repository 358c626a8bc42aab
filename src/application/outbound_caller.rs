//! The follow-up call agent and the tools it exposes
//!
//! One `OutboundCaller` exists per call. It remembers the dial information
//! and the callee participant, and turns the model's tool calls into call
//! control requests or static appointment answers.

use super::tools::{required_str, Tool, ToolRegistry};
use crate::domain::appointment::{AppointmentBook, Availability};
use crate::domain::call_control::{CallControl, CallControlError, Participant};
use crate::domain::dial_info::DialInfo;
use crate::domain::prompt::{TRANSFER_FAILED, TRANSFER_NOTICE};
use crate::domain::session::{AgentSession, ToolOutput};
use crate::infrastructure::call_metrics;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// Returned to the model when no transfer number was supplied
pub const CANNOT_TRANSFER: &str = "cannot transfer call";

pub struct OutboundCaller {
    dial_info: DialInfo,
    room_name: String,
    participant: RwLock<Option<Participant>>,
    call_control: Arc<dyn CallControl>,
    session: Arc<dyn AgentSession>,
    appointments: Arc<dyn AppointmentBook>,
    hung_up: AtomicBool,
}

impl OutboundCaller {
    pub fn new(
        dial_info: DialInfo,
        room_name: impl Into<String>,
        call_control: Arc<dyn CallControl>,
        session: Arc<dyn AgentSession>,
        appointments: Arc<dyn AppointmentBook>,
    ) -> Self {
        Self {
            dial_info,
            room_name: room_name.into(),
            participant: RwLock::new(None),
            call_control,
            session,
            appointments,
            hung_up: AtomicBool::new(false),
        }
    }

    pub fn dial_info(&self) -> &DialInfo {
        &self.dial_info
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// Keep the callee for transfers and logging
    pub fn set_participant(&self, participant: Participant) {
        if let Ok(mut slot) = self.participant.write() {
            *slot = Some(participant);
        }
    }

    /// Identity of the joined callee, or the dialed identity before the join
    pub fn participant_identity(&self) -> String {
        self.participant
            .read()
            .ok()
            .and_then(|p| p.as_ref().map(|p| p.identity.clone()))
            .unwrap_or_else(|| self.dial_info.participant_identity().to_string())
    }

    pub fn is_hung_up(&self) -> bool {
        self.hung_up.load(Ordering::SeqCst)
    }

    /// Hang up by deleting the room. Only the first call does anything.
    pub async fn hangup(&self) -> std::result::Result<(), CallControlError> {
        if self.hung_up.swap(true, Ordering::SeqCst) {
            debug!(room = %self.room_name, "call already torn down");
            return Ok(());
        }

        info!(room = %self.room_name, "hanging up");
        call_metrics::record_hangup();
        self.call_control.delete_room(&self.room_name).await
    }

    /// Transfer the call to a human agent, after telling the user
    pub async fn transfer_call(&self) -> Result<ToolOutput> {
        let Some(transfer_to) = self.dial_info.transfer_to.as_ref() else {
            return Ok(ToolOutput::Text(CANNOT_TRANSFER.to_string()));
        };

        info!("transferring call to {}", transfer_to);

        // let the message play fully before transferring
        if let Err(e) = self.session.generate_reply(TRANSFER_NOTICE).await {
            warn!("could not announce transfer: {}", e);
        }

        let identity = self.participant_identity();
        match self
            .call_control
            .transfer_sip_participant(&self.room_name, &identity, &transfer_to.tel_uri())
            .await
        {
            Ok(()) => {
                info!("transferred call to {}", transfer_to);
                call_metrics::record_transfer(true);
            }
            Err(e) => {
                error!("error transferring call: {}", e);
                call_metrics::record_transfer(false);
                if let Err(e) = self.session.generate_reply(TRANSFER_FAILED).await {
                    warn!("could not announce transfer failure: {}", e);
                }
                if let Err(e) = self.hangup().await {
                    error!("error hanging up after failed transfer: {}", e);
                }
            }
        }

        Ok(ToolOutput::Empty)
    }

    /// Hang up once the agent has finished speaking
    pub async fn end_call(&self) -> Result<ToolOutput> {
        info!("ending the call for {}", self.participant_identity());

        if let Err(e) = self.session.wait_for_playout().await {
            warn!("could not wait for playout: {}", e);
        }

        self.hangup().await?;
        Ok(ToolOutput::Empty)
    }

    pub async fn look_up_availability(&self, date: &str) -> Availability {
        info!(
            "looking up availability for {} on {}",
            self.participant_identity(),
            date
        );
        self.appointments.availability(date).await
    }

    pub async fn confirm_appointment(&self, date: &str, time: &str) -> String {
        info!(
            "confirming appointment for {} on {} at {}",
            self.participant_identity(),
            date,
            time
        );
        self.appointments.confirm(date, time).await
    }

    pub async fn detected_answering_machine(&self) -> Result<ToolOutput> {
        info!("detected answering machine for {}", self.participant_identity());
        self.hangup().await?;
        Ok(ToolOutput::Empty)
    }

    /// Registry with every tool this agent offers
    pub fn tool_registry(self: &Arc<Self>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(TransferCallTool(self.clone())));
        registry.register(Arc::new(EndCallTool(self.clone())));
        registry.register(Arc::new(LookUpAvailabilityTool(self.clone())));
        registry.register(Arc::new(ConfirmAppointmentTool(self.clone())));
        registry.register(Arc::new(DetectedAnsweringMachineTool(self.clone())));
        registry
    }
}

fn no_parameters() -> Value {
    json!({ "type": "object", "properties": {} })
}

pub struct TransferCallTool(Arc<OutboundCaller>);

#[async_trait]
impl Tool for TransferCallTool {
    fn name(&self) -> &str {
        "transfer_call"
    }

    fn description(&self) -> &str {
        "Transfer the call to a human agent, called after confirming with the user"
    }

    fn parameters(&self) -> Value {
        no_parameters()
    }

    async fn execute(&self, _args: Value) -> Result<ToolOutput> {
        self.0.transfer_call().await
    }
}

pub struct EndCallTool(Arc<OutboundCaller>);

#[async_trait]
impl Tool for EndCallTool {
    fn name(&self) -> &str {
        "end_call"
    }

    fn description(&self) -> &str {
        "Called when the user wants to end the call"
    }

    fn parameters(&self) -> Value {
        no_parameters()
    }

    async fn execute(&self, _args: Value) -> Result<ToolOutput> {
        self.0.end_call().await
    }
}

pub struct LookUpAvailabilityTool(Arc<OutboundCaller>);

#[async_trait]
impl Tool for LookUpAvailabilityTool {
    fn name(&self) -> &str {
        "look_up_availability"
    }

    fn description(&self) -> &str {
        "Called when the user asks about alternative appointment availability"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": {
                    "type": "string",
                    "description": "The date of the appointment to check availability for"
                }
            },
            "required": ["date"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput> {
        let date = required_str(&args, "date")?;
        let availability = self.0.look_up_availability(date).await;
        Ok(ToolOutput::Json(serde_json::to_value(availability)?))
    }
}

pub struct ConfirmAppointmentTool(Arc<OutboundCaller>);

#[async_trait]
impl Tool for ConfirmAppointmentTool {
    fn name(&self) -> &str {
        "confirm_appointment"
    }

    fn description(&self) -> &str {
        "Called when the user confirms their appointment on a specific date. \
         Use this tool only when they are certain about the date and time."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": { "type": "string", "description": "The date of the appointment" },
                "time": { "type": "string", "description": "The time of the appointment" }
            },
            "required": ["date", "time"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput> {
        let date = required_str(&args, "date")?;
        let time = required_str(&args, "time")?;
        Ok(ToolOutput::Text(self.0.confirm_appointment(date, time).await))
    }
}

pub struct DetectedAnsweringMachineTool(Arc<OutboundCaller>);

#[async_trait]
impl Tool for DetectedAnsweringMachineTool {
    fn name(&self) -> &str {
        "detected_answering_machine"
    }

    fn description(&self) -> &str {
        "Called when the call reaches voicemail. Use this tool AFTER you hear the voicemail greeting"
    }

    fn parameters(&self) -> Value {
        no_parameters()
    }

    async fn execute(&self, _args: Value) -> Result<ToolOutput> {
        self.0.detected_answering_machine().await
    }
}
