//! LiveKit server API integration
//!
//! Room, SIP and agent-dispatch services come from `livekit-api`. This
//! module only maps its errors and URLs onto ours.

pub mod call_control;

pub use call_control::{LiveKitCallControl, ParticipantDirectory};

use crate::domain::call_control::CallControlError;
use livekit_api::services::TwirpError;
use livekit_api::services::ServiceError;

/// Map a client URL (`ws://`, `wss://`) to the matching HTTP host.
pub fn api_host(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else {
        url.to_string()
    }
}

/// Server-side rejections keep their Twirp code; everything else is transport.
pub fn map_service_error(e: ServiceError) -> CallControlError {
    match e {
        ServiceError::Twirp(TwirpError::Twirp(twirp)) => CallControlError::Api {
            code: twirp.code,
            message: twirp.msg,
            sip_status_code: None,
            sip_status: None,
        },
        ServiceError::AccessToken(e) => CallControlError::Config(e.to_string()),
        other => CallControlError::Transport(other.to_string()),
    }
}
