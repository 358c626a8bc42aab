//! Dispatch through the agent dispatch API, without the CLI

use crate::config::LiveKitConfig;
use crate::domain::dispatch::{DispatchError, DispatchReceipt, DispatchRequest, Dispatcher};
use crate::infrastructure::livekit::{api_host, map_service_error};
use async_trait::async_trait;
use livekit_api::services::agent_dispatch::AgentDispatchClient;
use livekit_protocol::{AgentDispatch, CreateAgentDispatchRequest};
use tracing::info;
use uuid::Uuid;

pub struct ApiDispatcher {
    client: AgentDispatchClient,
    agent_name: String,
}

impl ApiDispatcher {
    pub fn new(config: &LiveKitConfig, agent_name: &str) -> Self {
        Self {
            client: AgentDispatchClient::with_api_key(
                &api_host(&config.url),
                &config.api_key,
                &config.api_secret,
            ),
            agent_name: agent_name.to_string(),
        }
    }
}

/// Every dispatched call gets a fresh room
pub fn new_room_name() -> String {
    format!("call-{}", Uuid::new_v4().simple())
}

fn dispatch_request(room: &str, agent_name: &str, request: &DispatchRequest) -> CreateAgentDispatchRequest {
    CreateAgentDispatchRequest {
        agent_name: agent_name.to_string(),
        room: room.to_string(),
        metadata: request.metadata(),
        ..Default::default()
    }
}

fn receipt(dispatch: &AgentDispatch) -> DispatchReceipt {
    DispatchReceipt {
        stdout: format!(
            "Dispatch {} created for agent {} in room {}",
            dispatch.id, dispatch.agent_name, dispatch.room
        ),
        stderr: String::new(),
    }
}

#[async_trait]
impl Dispatcher for ApiDispatcher {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchReceipt, DispatchError> {
        let room = new_room_name();
        info!(%room, agent = %self.agent_name, "dispatching call to {}", request.phone_number());

        let dispatch = self
            .client
            .create_dispatch(dispatch_request(&room, &self.agent_name, request))
            .await
            .map_err(|e| DispatchError::Api(map_service_error(e).to_string()))?;

        Ok(receipt(&dispatch))
    }

    fn program(&self) -> String {
        "agent dispatch API".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_room_names_are_unique() {
        let a = new_room_name();
        let b = new_room_name();
        assert!(a.starts_with("call-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_dispatch_request_carries_dial_info() {
        let request = DispatchRequest::from_form("+918980579954", "").unwrap();
        let body = dispatch_request("call-1", "outbound-caller", &request);
        assert_eq!(body.agent_name, "outbound-caller");
        assert_eq!(body.room, "call-1");
        assert_eq!(body.metadata, request.metadata());
    }

    #[test]
    fn test_receipt_names_dispatch_and_room() {
        let dispatch = AgentDispatch {
            id: "AD_1".to_string(),
            agent_name: "outbound-caller".to_string(),
            room: "call-1".to_string(),
            ..Default::default()
        };
        let receipt = receipt(&dispatch);
        assert_eq!(
            receipt.stdout,
            "Dispatch AD_1 created for agent outbound-caller in room call-1"
        );
        assert!(receipt.stderr.is_empty());
    }
}
