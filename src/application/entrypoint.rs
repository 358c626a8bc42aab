//! Call job entrypoint
//!
//! Starts the agent session and dials the callee at the same time, waits
//! for both, then serves the agent's tool calls until the session ends or
//! the call is torn down.

use super::outbound_caller::OutboundCaller;
use crate::config::Config;
use crate::domain::appointment::AppointmentBook;
use crate::domain::call_control::{CallControl, CallControlError, OutboundDial};
use crate::domain::dial_info::DialInfo;
use crate::domain::prompt::FOLLOW_UP_INSTRUCTIONS;
use crate::domain::session::{
    AgentSession, NoiseCancellation, SessionError, SessionEvent, SessionStart,
};
use crate::domain::DomainError;
use crate::infrastructure::call_metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A dispatched call: the room to run in and the serialized dial info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallJob {
    #[serde(default = "new_job_id")]
    pub job_id: String,
    pub room_name: String,
    pub metadata: String,
}

fn new_job_id() -> String {
    format!("job-{}", Uuid::new_v4().simple())
}

impl CallJob {
    pub fn new(room_name: impl Into<String>, metadata: impl Into<String>) -> Self {
        Self {
            job_id: new_job_id(),
            room_name: room_name.into(),
            metadata: metadata.into(),
        }
    }
}

/// Per-deployment settings applied to every call
#[derive(Debug, Clone)]
pub struct CallSettings {
    pub sip_trunk_id: String,
    pub caller_number: String,
    pub participant_wait_timeout: Duration,
    pub instructions: String,
}

impl CallSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sip_trunk_id: config.sip.outbound_trunk_id.clone(),
            caller_number: config.sip.caller_number.clone(),
            participant_wait_timeout: config.sip.participant_wait_timeout(),
            instructions: FOLLOW_UP_INSTRUCTIONS.to_string(),
        }
    }
}

/// Ports a call job runs against
#[derive(Clone)]
pub struct CallDependencies {
    pub call_control: Arc<dyn CallControl>,
    pub session: Arc<dyn AgentSession>,
    pub appointments: Arc<dyn AppointmentBook>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The conversation ran and ended (hang-up, transfer or session close)
    Completed,
    /// The callee could not be reached
    DialFailed(String),
    /// The speech pipeline refused the session
    SessionFailed(String),
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("invalid job: {0}")]
    Metadata(#[from] DomainError),

    #[error("participant lookup failed: {0}")]
    Participant(CallControlError),

    #[error("could not open agent session: {0}")]
    Session(#[from] SessionError),
}

pub async fn run_call_job(
    job: &CallJob,
    settings: &CallSettings,
    deps: CallDependencies,
) -> Result<JobOutcome, JobError> {
    info!(job_id = %job.job_id, "connecting to room {}", job.room_name);

    let dial_info = DialInfo::from_metadata(&job.metadata)?;
    let identity = dial_info.participant_identity().to_string();

    let caller = Arc::new(OutboundCaller::new(
        dial_info.clone(),
        job.room_name.clone(),
        deps.call_control.clone(),
        deps.session.clone(),
        deps.appointments.clone(),
    ));
    let registry = caller.tool_registry();

    let start = SessionStart {
        room_name: job.room_name.clone(),
        instructions: settings.instructions.clone(),
        tools: registry.definitions(),
        noise_cancellation: NoiseCancellation::BackgroundVoiceTelephony,
    };
    let dial = OutboundDial {
        room_name: job.room_name.clone(),
        sip_trunk_id: settings.sip_trunk_id.clone(),
        sip_call_to: dial_info.phone_number.to_string(),
        sip_number: settings.caller_number.clone(),
        participant_identity: identity.clone(),
        wait_until_answered: true,
    };

    // the session starts alongside the dial so the callee's first words are heard
    let (started, dialed) = tokio::join!(
        deps.session.start(start),
        deps.call_control.create_sip_participant(&dial)
    );

    if let Err(e) = dialed {
        match &e {
            CallControlError::Api {
                message,
                sip_status_code,
                sip_status,
                ..
            } => error!(
                "error creating SIP participant: {}, SIP status: {} {}",
                message,
                sip_status_code.as_deref().unwrap_or(""),
                sip_status.as_deref().unwrap_or("")
            ),
            other => error!("error creating SIP participant: {}", other),
        }
        call_metrics::record_dial(false);
        shutdown(&caller, deps.session.as_ref()).await;
        return Ok(JobOutcome::DialFailed(e.to_string()));
    }
    call_metrics::record_dial(true);

    if let Err(e) = started {
        error!("error starting agent session: {}", e);
        shutdown(&caller, deps.session.as_ref()).await;
        return Ok(JobOutcome::SessionFailed(e.to_string()));
    }

    let participant = match deps
        .call_control
        .wait_for_participant(&job.room_name, &identity, settings.participant_wait_timeout)
        .await
    {
        Ok(participant) => participant,
        Err(e) => {
            error!("error waiting for participant {}: {}", identity, e);
            shutdown(&caller, deps.session.as_ref()).await;
            return Err(JobError::Participant(e));
        }
    };
    info!("participant joined: {}", participant.identity);
    caller.set_participant(participant);

    serve_tool_calls(&caller, &registry, deps.session.as_ref()).await;

    if let Err(e) = deps.session.close().await {
        debug!("session close after call end: {}", e);
    }
    info!(job_id = %job.job_id, "call finished");
    Ok(JobOutcome::Completed)
}

async fn serve_tool_calls(
    caller: &OutboundCaller,
    registry: &super::tools::ToolRegistry,
    session: &dyn AgentSession,
) {
    while !caller.is_hung_up() {
        match session.next_event().await {
            Some(SessionEvent::ToolCall(call)) => {
                debug!(call_id = %call.id, tool = %call.name, "running tool");
                let result = registry.dispatch(&call).await;
                if let Err(e) = session
                    .submit_tool_output(&call.id, result.output, result.is_error)
                    .await
                {
                    warn!(call_id = %call.id, "could not return tool output: {}", e);
                }
            }
            Some(SessionEvent::Closed { reason }) => {
                info!("agent session closed: {}", reason);
                break;
            }
            None => break,
        }
    }
}

/// Stop the agent and tear the call down
async fn shutdown(caller: &OutboundCaller, session: &dyn AgentSession) {
    if let Err(e) = session.close().await {
        debug!("session close during shutdown: {}", e);
    }
    if let Err(e) = caller.hangup().await {
        warn!("error tearing down room {}: {}", caller.room_name(), e);
    }
}
